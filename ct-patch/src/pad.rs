//! 空间填充.
//!
//! 当体数据在某个轴上比 patch 小时, 可以先填充再采样. 填充只作用于最后三个
//! (空间) 轴, 通道轴不变.

use std::str::FromStr;

use log::debug;
use ndarray::{Array4, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::parse_values;
use crate::sample::{Entry, Sample, Volume};
use crate::{array_to_idx3d, idx3d_to_array, ConfigError, Idx3d};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 三个空间轴两端的填充量, 按 `(h, w, d)` 顺序组织.
///
/// 若原形状为 `H x W x D`, 填充后为
/// `(h_ini + H + h_fin) x (w_ini + W + w_fin) x (d_ini + D + d_fin)`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Padding {
    ini: Idx3d,
    fin: Idx3d,
}

impl Padding {
    /// 分别指定起始端和末尾端的填充量.
    #[inline]
    pub const fn new(ini: Idx3d, fin: Idx3d) -> Self {
        Self { ini, fin }
    }

    /// 六个方向均填充 `n`.
    #[inline]
    pub const fn uniform(n: usize) -> Self {
        Self::new((n, n, n), (n, n, n))
    }

    /// 每个轴两端对称填充.
    #[inline]
    pub const fn symmetric(per_axis: Idx3d) -> Self {
        Self::new(per_axis, per_axis)
    }

    /// 使空间形状为 `shape` 的体数据至少能容纳 `patch_size` 的最小填充.
    ///
    /// 每个轴上的缺口尽量平分到两端, 奇数时末尾端多填一个. 已足够大的轴不填充.
    pub fn to_fit(shape: Idx3d, patch_size: Idx3d) -> Self {
        let sh = idx3d_to_array(shape);
        let ps = idx3d_to_array(patch_size);
        let mut ini = [0usize; 3];
        let mut fin = [0usize; 3];
        for k in 0..3 {
            let gap = ps[k].saturating_sub(sh[k]);
            ini[k] = gap / 2;
            fin[k] = gap - ini[k];
        }
        Self::new(array_to_idx3d(ini), array_to_idx3d(fin))
    }

    /// 起始端填充量.
    #[inline]
    pub fn ini(&self) -> Idx3d {
        self.ini
    }

    /// 末尾端填充量.
    #[inline]
    pub fn fin(&self) -> Idx3d {
        self.fin
    }

    /// 是否不做任何填充.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.ini == (0, 0, 0) && self.fin == (0, 0, 0)
    }

    /// 空间形状 `shape` 填充后的形状.
    pub fn padded_shape(&self, shape: Idx3d) -> Idx3d {
        let (h, w, d) = shape;
        (
            self.ini.0 + h + self.fin.0,
            self.ini.1 + w + self.fin.1,
            self.ini.2 + d + self.fin.2,
        )
    }
}

/// 接受 1 个值 (六个方向相同), 3 个值 (每轴两端对称) 或 6 个值
/// `(h_ini, h_fin, w_ini, w_fin, d_ini, d_fin)`.
impl TryFrom<&[usize]> for Padding {
    type Error = ConfigError;

    fn try_from(values: &[usize]) -> Result<Self, Self::Error> {
        match *values {
            [n] => Ok(Self::uniform(n)),
            [h, w, d] => Ok(Self::symmetric((h, w, d))),
            [h0, h1, w0, w1, d0, d1] => Ok(Self::new((h0, w0, d0), (h1, w1, d1))),
            _ => Err(ConfigError::Arity {
                expected: "1, 3 or 6",
                found: values.len(),
            }),
        }
    }
}

impl FromStr for Padding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(parse_values(s)?.as_slice())
    }
}

/// 填充模式.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PaddingMode {
    /// 以常数填充.
    #[default]
    Constant,

    /// 镜像填充, 不重复边缘体素. 别名 `mirror`.
    Reflect,

    /// 以边缘体素填充. 别名 `replicate`.
    Edge,

    /// 循环填充: 末尾的值填到开头, 开头的值填到末尾. 别名 `circular`.
    Wrap,
}

impl FromStr for PaddingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Self::Constant),
            "reflect" | "mirror" => Ok(Self::Reflect),
            "edge" | "replicate" => Ok(Self::Edge),
            "circular" | "wrap" => Ok(Self::Wrap),
            _ => Err(ConfigError::PaddingMode(s.to_owned())),
        }
    }
}

impl PaddingMode {
    /// 填充后第 `i` 个位置 (相对原轴起点, 可以为负) 对应原轴上的哪个位置.
    /// 原轴长度为 `n`. `None` 表示该位置应使用常数填充.
    fn source_index(&self, i: isize, n: usize) -> Option<usize> {
        let len = n as isize;
        if (0..len).contains(&i) {
            return Some(i as usize);
        }
        match self {
            Self::Constant => None,
            Self::Edge => Some(i.clamp(0, len - 1) as usize),
            Self::Wrap => Some(i.rem_euclid(len) as usize),
            Self::Reflect if n == 1 => Some(0),
            Self::Reflect => {
                let period = 2 * (len - 1);
                let m = i.rem_euclid(period);
                let m = if m < len { m } else { period - m };
                Some(m as usize)
            }
        }
    }

    /// 计算一个轴上所有填充后位置到原位置的映射.
    fn axis_map(&self, n: usize, ini: usize, fin: usize) -> Vec<Option<usize>> {
        (0..ini + n + fin)
            .map(|o| self.source_index(o as isize - ini as isize, n))
            .collect()
    }
}

/// 填充体数据的空间轴.
///
/// `fill` 只在 [`PaddingMode::Constant`] 下使用. 对长度为 0 的轴, 非常数模式没有
/// 可参照的体素, 此时同样以 `fill` 填充.
pub fn pad<T>(volume: &Volume<T>, padding: &Padding, mode: PaddingMode, fill: T) -> Volume<T>
where
    T: Clone + Send + Sync,
{
    if padding.is_zero() {
        return volume.clone();
    }

    let (c, h, w, d) = volume.dim();
    let (nh, nw, nd) = padding.padded_shape((h, w, d));
    let (ini, fin) = (padding.ini(), padding.fin());

    let axis_map = |n: usize, a: usize, b: usize| {
        if n == 0 {
            vec![None; a + b]
        } else {
            mode.axis_map(n, a, b)
        }
    };
    let map_h = axis_map(h, ini.0, fin.0);
    let map_w = axis_map(w, ini.1, fin.1);
    let map_d = axis_map(d, ini.2, fin.2);

    let mut out = Array4::from_elem((c, nh, nw, nd), fill);
    let copy_from_source = |(ch, i, j, k): (usize, usize, usize, usize), dst: &mut T| {
        if let (Some(si), Some(sj), Some(sk)) = (map_h[i], map_w[j], map_d[k]) {
            *dst = volume[[ch, si, sj, sk]].clone();
        }
    };

    #[cfg(feature = "rayon")]
    Zip::indexed(&mut out).par_for_each(copy_from_source);
    #[cfg(not(feature = "rayon"))]
    Zip::indexed(&mut out).for_each(copy_from_source);

    out.into_shared()
}

/// 以相同设置填充样本中的所有影像条目. 非影像条目共享, 元信息保持不变.
pub fn pad_sample<T>(
    sample: &Sample<T>,
    padding: &Padding,
    mode: PaddingMode,
    fill: T,
) -> Sample<T>
where
    T: Clone + Send + Sync,
{
    debug!("Padding sample with {padding:?} in {mode:?} mode");

    let pad_entry = |(name, entry): (&str, &Entry<T>)| {
        let entry = match entry {
            Entry::Image(img) => {
                Entry::Image(img.with_data(pad(img.data(), padding, mode, fill.clone())))
            }
            Entry::Attr(a) => Entry::Attr(a.clone()),
        };
        (name.to_owned(), entry)
    };

    #[cfg(feature = "rayon")]
    let entries = sample
        .iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(pad_entry)
        .collect();
    #[cfg(not(feature = "rayon"))]
    let entries = sample.iter().map(pad_entry).collect();

    Sample::from_entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImageEntry, PatchSampler};
    use ndarray::{arr1, s, Array, Array1};
    use std::sync::Arc;

    /// 沿 `h` 轴排布 `0..n` 的单通道体数据, 形状为 `(1, n, 1, 1)`.
    fn line(n: usize) -> Volume<i32> {
        Array::from_iter(0..n as i32)
            .into_shape((1, n, 1, 1))
            .unwrap()
            .into_shared()
    }

    fn padded_line(n: usize, ini: usize, fin: usize, mode: PaddingMode) -> Array1<i32> {
        let padding = Padding::new((ini, 0, 0), (fin, 0, 0));
        let out = pad(&line(n), &padding, mode, -1);
        out.slice(s![0, .., 0, 0]).to_owned()
    }

    #[test]
    fn test_padding_modes() {
        assert_eq!(
            padded_line(4, 2, 3, PaddingMode::Constant),
            arr1(&[-1, -1, 0, 1, 2, 3, -1, -1, -1])
        );
        assert_eq!(
            padded_line(4, 2, 3, PaddingMode::Edge),
            arr1(&[0, 0, 0, 1, 2, 3, 3, 3, 3])
        );
        assert_eq!(
            padded_line(4, 2, 3, PaddingMode::Wrap),
            arr1(&[2, 3, 0, 1, 2, 3, 0, 1, 2])
        );
        assert_eq!(
            padded_line(4, 2, 3, PaddingMode::Reflect),
            arr1(&[2, 1, 0, 1, 2, 3, 2, 1, 0])
        );
    }

    #[test]
    fn test_reflect_longer_than_axis() {
        // 周期为 2 * (3 - 1) = 4: ... 1 | 0 1 2 | 1 0 1 2 1
        assert_eq!(
            padded_line(3, 5, 5, PaddingMode::Reflect),
            arr1(&[1, 0, 1, 2, 1, 0, 1, 2, 1, 0, 1, 2, 1])
        );
        assert_eq!(
            padded_line(1, 2, 2, PaddingMode::Reflect),
            arr1(&[0, 0, 0, 0, 0])
        );
    }

    #[test]
    fn test_padding_mode_from_str() {
        for (name, mode) in [
            ("constant", PaddingMode::Constant),
            ("reflect", PaddingMode::Reflect),
            ("mirror", PaddingMode::Reflect),
            ("edge", PaddingMode::Edge),
            ("replicate", PaddingMode::Edge),
            ("circular", PaddingMode::Wrap),
            ("wrap", PaddingMode::Wrap),
        ] {
            assert_eq!(name.parse::<PaddingMode>(), Ok(mode));
        }
        let err = "symmetric".parse::<PaddingMode>().unwrap_err();
        assert_eq!(err, ConfigError::PaddingMode("symmetric".to_string()));
        assert!(err.to_string().contains("replicate"));
    }

    #[test]
    fn test_padding_from_values() {
        assert_eq!("2".parse::<Padding>(), Ok(Padding::uniform(2)));
        assert_eq!("1,2,3".parse::<Padding>(), Ok(Padding::symmetric((1, 2, 3))));
        assert_eq!(
            "1,2,3,4,5,6".parse::<Padding>(),
            Ok(Padding::new((1, 3, 5), (2, 4, 6)))
        );
        assert!(matches!(
            "1,2".parse::<Padding>(),
            Err(ConfigError::Arity { found: 2, .. })
        ));
        assert_eq!(
            Padding::new((1, 3, 5), (2, 4, 6)).padded_shape((10, 10, 10)),
            (13, 17, 21)
        );
    }

    #[test]
    fn test_to_fit() {
        let p = Padding::to_fit((10, 20, 5), (16, 16, 8));
        assert_eq!(p, Padding::new((3, 0, 1), (3, 0, 2)));
        assert_eq!(p.padded_shape((10, 20, 5)), (16, 20, 8));
        assert!(Padding::to_fit((10, 10, 10), (4, 4, 4)).is_zero());
    }

    #[test]
    fn test_pad_keeps_channels_and_interior() {
        let vol = Array::from_iter(0..2 * 3 * 4 * 5)
            .into_shape((2, 3, 4, 5))
            .unwrap()
            .into_shared();
        let padding = Padding::new((1, 0, 2), (2, 1, 0));
        let out = pad(&vol, &padding, PaddingMode::Edge, 0);
        assert_eq!(out.dim(), (2, 6, 5, 7));
        assert_eq!(out.slice(s![.., 1..4, 0..4, 2..7]), vol);

        assert!(pad(&vol, &Padding::default(), PaddingMode::Constant, 0) == vol);
    }

    #[test]
    fn test_pad_sample_then_sample_patches() {
        let img = ImageEntry::intensity(Array::<f32, _>::ones((1, 6, 6, 3)));
        let lab = ImageEntry::label(Array::<f32, _>::zeros((2, 6, 6, 3)));
        let src = Sample::new()
            .with_image("ct", img)
            .with_attr("subject", "sub-01")
            .with_image("seg", lab);

        let padding = Padding::to_fit(src.spatial_shape().unwrap(), (8, 4, 4));
        let padded = pad_sample(&src, &padding, PaddingMode::Constant, 0.0);
        assert_eq!(padded.keys().collect::<Vec<_>>(), ["ct", "subject", "seg"]);
        assert_eq!(padded.spatial_shape(), Ok((8, 6, 4)));
        assert_eq!(padded.image("seg").unwrap().channels(), 2);
        assert!(Arc::ptr_eq(
            src.attr("subject").unwrap(),
            padded.attr("subject").unwrap()
        ));

        let sampler = PatchSampler::new(padded, [8usize, 4, 4]).unwrap();
        for patch in sampler.iter_seeded(9).take(50) {
            let patch = patch.unwrap();
            assert_eq!(patch.index_ini().0, 0);
            assert_eq!(patch.image("ct").unwrap().spatial_shape(), (8, 4, 4));
        }
    }
}
