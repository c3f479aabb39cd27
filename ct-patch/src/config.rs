//! 配置项: patch 大小与复制策略.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Idx3d};

/// patch 大小. 三个分量均为正整数, 按 `(h, w, d)` 顺序组织.
///
/// 可以从单个整数 (立方体) 或三个整数 (逐轴) 构造, 其它个数一律返回
/// [`ConfigError::Arity`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<usize>", into = "Vec<usize>"))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PatchSize {
    h: usize,
    w: usize,
    d: usize,
}

impl PatchSize {
    /// 逐轴指定 patch 大小. 任一分量为 0 时返回 `Err`.
    pub fn new(h: usize, w: usize, d: usize) -> Result<Self, ConfigError> {
        if h == 0 || w == 0 || d == 0 {
            return Err(ConfigError::NonPositive((h, w, d)));
        }
        Ok(Self { h, w, d })
    }

    /// 边长为 `n` 的立方体 patch.
    #[inline]
    pub fn cube(n: usize) -> Result<Self, ConfigError> {
        Self::new(n, n, n)
    }

    /// 高.
    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }

    /// 宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    /// 深.
    #[inline]
    pub fn depth(&self) -> usize {
        self.d
    }

    /// 以三维索引形式获取.
    #[inline]
    pub fn as_idx(&self) -> Idx3d {
        (self.h, self.w, self.d)
    }

    /// patch 内的体素个数 (单通道).
    #[inline]
    pub fn voxels(&self) -> usize {
        self.h * self.w * self.d
    }
}

impl fmt::Display for PatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.h, self.w, self.d)
    }
}

impl TryFrom<usize> for PatchSize {
    type Error = ConfigError;

    #[inline]
    fn try_from(n: usize) -> Result<Self, Self::Error> {
        Self::cube(n)
    }
}

impl TryFrom<Idx3d> for PatchSize {
    type Error = ConfigError;

    #[inline]
    fn try_from((h, w, d): Idx3d) -> Result<Self, Self::Error> {
        Self::new(h, w, d)
    }
}

impl TryFrom<[usize; 3]> for PatchSize {
    type Error = ConfigError;

    #[inline]
    fn try_from([h, w, d]: [usize; 3]) -> Result<Self, Self::Error> {
        Self::new(h, w, d)
    }
}

impl TryFrom<&[usize]> for PatchSize {
    type Error = ConfigError;

    fn try_from(values: &[usize]) -> Result<Self, Self::Error> {
        match *values {
            [n] => Self::cube(n),
            [h, w, d] => Self::new(h, w, d),
            _ => Err(ConfigError::Arity {
                expected: "1 or 3",
                found: values.len(),
            }),
        }
    }
}

impl TryFrom<Vec<usize>> for PatchSize {
    type Error = ConfigError;

    #[inline]
    fn try_from(values: Vec<usize>) -> Result<Self, Self::Error> {
        Self::try_from(values.as_slice())
    }
}

impl From<PatchSize> for Vec<usize> {
    #[inline]
    fn from(p: PatchSize) -> Self {
        vec![p.h, p.w, p.d]
    }
}

/// 接受 `"64"`, `"64,64,32"` 或 `"64x64x32"` 这样的写法.
impl FromStr for PatchSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(parse_values(s)?.as_slice())
    }
}

/// 将以 `,` 或 `x` 分隔的非负整数列表解析出来. 两端空白会被忽略.
pub(crate) fn parse_values(s: &str) -> Result<Vec<usize>, ConfigError> {
    s.split([',', 'x'])
        .map(str::trim)
        .map(|t| t.parse().map_err(|_| ConfigError::Parse(t.to_owned())))
        .collect()
}

/// 裁剪时非影像条目与影像数据的复制策略.
///
/// # 注意
///
/// [`CopyPolicy::Shared`] 下, 所有 patch 与原样本共享非影像条目和影像数据缓冲区.
/// 这些条目通过 `Arc` 持有, 本 crate 不会修改它们; 但若调用方借助内部可变性
/// 或在别处持有可变所有权, 修改会对所有 patch 可见. 需要隔离时请使用
/// [`CopyPolicy::Deep`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum CopyPolicy {
    /// 浅复制. 非影像条目按引用共享, 裁剪结果是原缓冲区上的视图.
    #[default]
    Shared,

    /// 深复制. 非影像条目克隆一份新值, 裁剪结果复制到新的标准布局缓冲区.
    Deep,
}

impl CopyPolicy {
    /// 是否为深复制.
    #[inline]
    pub fn is_deep(&self) -> bool {
        matches!(self, Self::Deep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_size_from_single_value() {
        let p = PatchSize::try_from(16usize).unwrap();
        assert_eq!(p.as_idx(), (16, 16, 16));
        assert_eq!(p.voxels(), 4096);

        let p = PatchSize::try_from([5usize].as_slice()).unwrap();
        assert_eq!(p.as_idx(), (5, 5, 5));
    }

    #[test]
    fn test_patch_size_from_three_values() {
        let p = PatchSize::try_from([4usize, 5, 6].as_slice()).unwrap();
        assert_eq!((p.height(), p.width(), p.depth()), (4, 5, 6));
        assert_eq!(PatchSize::try_from((4usize, 5usize, 6usize)), Ok(p));
        assert_eq!(PatchSize::try_from([4usize, 5, 6]), Ok(p));
    }

    #[test]
    fn test_patch_size_wrong_arity() {
        let cases: [&[usize]; 3] = [&[], &[1, 2], &[1, 2, 3, 4]];
        for values in cases {
            assert_eq!(
                PatchSize::try_from(values),
                Err(ConfigError::Arity {
                    expected: "1 or 3",
                    found: values.len()
                })
            );
        }
    }

    #[test]
    fn test_patch_size_non_positive() {
        assert_eq!(PatchSize::cube(0), Err(ConfigError::NonPositive((0, 0, 0))));
        assert_eq!(
            PatchSize::new(3, 0, 3),
            Err(ConfigError::NonPositive((3, 0, 3)))
        );
    }

    #[test]
    fn test_patch_size_from_str() {
        assert_eq!("32".parse::<PatchSize>(), PatchSize::cube(32));
        assert_eq!(" 8, 16 ,32 ".parse::<PatchSize>(), PatchSize::new(8, 16, 32));
        assert_eq!("8x16x32".parse::<PatchSize>(), PatchSize::new(8, 16, 32));
        assert_eq!(
            "8,a,32".parse::<PatchSize>(),
            Err(ConfigError::Parse("a".to_string()))
        );
        assert!(matches!(
            "1,2".parse::<PatchSize>(),
            Err(ConfigError::Arity { found: 2, .. })
        ));
        assert_eq!(PatchSize::new(8, 16, 32).unwrap().to_string(), "8x16x32");
    }
}
