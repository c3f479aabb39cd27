//! 样本数据模型.
//!
//! 一个 [`Sample`] 是按插入顺序排列的 `名称 -> 条目` 映射. 条目要么是保存
//! `(C, H, W, D)` 体数据的影像条目, 要么是不透明的非影像条目.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use ndarray::{ArcArray, Array3, Array4, Axis, Ix4};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Idx3d, SampleError, SampleResult};

/// 体数据, 轴顺序为 `(C, H, W, D)`.
///
/// 克隆只增加引用计数; 对克隆做切片即得到共享所有权的零拷贝视图.
pub type Volume<T> = ArcArray<T, Ix4>;

/// 影像类别. 只作为元信息携带, 不影响裁剪行为.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ImageKind {
    /// 强度影像 (CT HU, MR 信号等).
    #[default]
    Intensity,

    /// 标签图.
    Label,
}

/// 不透明的非影像值. 既用作样本顶层的非影像条目, 也用作影像条目的元信息.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Attr {
    /// 文本.
    Text(String),

    /// 整数.
    Int(i64),

    /// 浮点数.
    Float(f64),

    /// 浮点数组, 如体素间距.
    Floats(Vec<f64>),

    /// 三维索引.
    Index(Idx3d),

    /// 文件路径.
    Path(PathBuf),
}

impl From<String> for Attr {
    #[inline]
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Attr {
    #[inline]
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<i64> for Attr {
    #[inline]
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Attr {
    #[inline]
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Vec<f64>> for Attr {
    #[inline]
    fn from(v: Vec<f64>) -> Self {
        Self::Floats(v)
    }
}

impl From<Idx3d> for Attr {
    #[inline]
    fn from(i: Idx3d) -> Self {
        Self::Index(i)
    }
}

impl From<PathBuf> for Attr {
    #[inline]
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

/// 影像条目: 体数据加任意元信息.
#[derive(Clone, Debug)]
pub struct ImageEntry<T> {
    kind: ImageKind,
    data: Volume<T>,
    meta: BTreeMap<String, Attr>,
}

impl<T> ImageEntry<T> {
    /// 由共享体数据构建.
    #[inline]
    pub fn new(kind: ImageKind, data: Volume<T>) -> Self {
        Self {
            kind,
            data,
            meta: BTreeMap::new(),
        }
    }

    /// 由 `(C, H, W, D)` 强度体数据构建.
    #[inline]
    pub fn intensity(data: Array4<T>) -> Self {
        Self::new(ImageKind::Intensity, data.into_shared())
    }

    /// 由 `(C, H, W, D)` 标签体数据构建.
    #[inline]
    pub fn label(data: Array4<T>) -> Self {
        Self::new(ImageKind::Label, data.into_shared())
    }

    /// 由单通道 `(H, W, D)` 体数据构建, 在最前面插入长度为 1 的通道轴.
    #[inline]
    pub fn from_array3(kind: ImageKind, data: Array3<T>) -> Self {
        Self::new(kind, data.insert_axis(Axis(0)).into_shared())
    }

    /// 附加一项元信息, 同名项会被覆盖.
    #[inline]
    pub fn with_meta<K: Into<String>, V: Into<Attr>>(mut self, key: K, value: V) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// 影像类别.
    #[inline]
    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// 体数据.
    #[inline]
    pub fn data(&self) -> &Volume<T> {
        &self.data
    }

    /// 消费自我, 获得底层体数据.
    #[inline]
    pub fn into_data(self) -> Volume<T> {
        self.data
    }

    /// 元信息.
    #[inline]
    pub fn meta(&self) -> &BTreeMap<String, Attr> {
        &self.meta
    }

    /// 可变元信息.
    #[inline]
    pub fn meta_mut(&mut self) -> &mut BTreeMap<String, Attr> {
        &mut self.meta
    }

    /// 通道数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.data.dim().0
    }

    /// 空间形状 `(H, W, D)`.
    #[inline]
    pub fn spatial_shape(&self) -> Idx3d {
        let (_, h, w, d) = self.data.dim();
        (h, w, d)
    }

    /// 保留类别和元信息, 替换体数据.
    #[inline]
    pub(crate) fn with_data(&self, data: Volume<T>) -> Self {
        Self {
            kind: self.kind,
            data,
            meta: self.meta.clone(),
        }
    }
}

/// 样本条目.
#[derive(Clone, Debug)]
pub enum Entry<T> {
    /// 影像条目, 参与裁剪.
    Image(ImageEntry<T>),

    /// 非影像条目, 原样传递. 以 `Arc` 持有, 以便在 patch 之间共享.
    Attr(Arc<Attr>),
}

impl<T> Entry<T> {
    /// 是否为影像条目.
    #[inline]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    /// 尝试获得影像条目.
    #[inline]
    pub fn as_image(&self) -> Option<&ImageEntry<T>> {
        match self {
            Self::Image(img) => Some(img),
            Self::Attr(_) => None,
        }
    }

    /// 尝试获得非影像条目.
    #[inline]
    pub fn as_attr(&self) -> Option<&Arc<Attr>> {
        match self {
            Self::Image(_) => None,
            Self::Attr(a) => Some(a),
        }
    }
}

impl<T> From<ImageEntry<T>> for Entry<T> {
    #[inline]
    fn from(img: ImageEntry<T>) -> Self {
        Self::Image(img)
    }
}

impl<T> From<Attr> for Entry<T> {
    #[inline]
    fn from(a: Attr) -> Self {
        Self::Attr(Arc::new(a))
    }
}

impl<T> From<Arc<Attr>> for Entry<T> {
    #[inline]
    fn from(a: Arc<Attr>) -> Self {
        Self::Attr(a)
    }
}

/// 样本. 名称唯一, 保持插入顺序; "第一个影像条目" 即按插入顺序的第一个.
///
/// 样本在 patch 提取过程中从不被原地修改.
#[derive(Clone, Debug)]
pub struct Sample<T> {
    entries: Vec<(String, Entry<T>)>,
}

impl<T> Default for Sample<T> {
    #[inline]
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Sample<T> {
    /// 空样本.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 由已保证名称唯一的条目序列直接构建.
    #[inline]
    pub(crate) fn from_entries(entries: Vec<(String, Entry<T>)>) -> Self {
        Self { entries }
    }

    /// 插入条目. 若同名条目已存在, 则原地替换 (保持原有位置) 并返回旧条目.
    pub fn insert<K: Into<String>, E: Into<Entry<T>>>(
        &mut self,
        name: K,
        entry: E,
    ) -> Option<Entry<T>> {
        let name = name.into();
        let entry = entry.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, old)) => Some(std::mem::replace(old, entry)),
            None => {
                self.entries.push((name, entry));
                None
            }
        }
    }

    /// 插入影像条目.
    #[inline]
    pub fn insert_image<K: Into<String>>(
        &mut self,
        name: K,
        image: ImageEntry<T>,
    ) -> Option<Entry<T>> {
        self.insert(name, Entry::Image(image))
    }

    /// 插入非影像条目.
    #[inline]
    pub fn insert_attr<K: Into<String>, V: Into<Attr>>(
        &mut self,
        name: K,
        value: V,
    ) -> Option<Entry<T>> {
        let value: Attr = value.into();
        self.insert(name, Entry::from(value))
    }

    /// builder 风格的 [`Sample::insert_image`].
    #[inline]
    pub fn with_image<K: Into<String>>(mut self, name: K, image: ImageEntry<T>) -> Self {
        self.insert_image(name, image);
        self
    }

    /// builder 风格的 [`Sample::insert_attr`].
    #[inline]
    pub fn with_attr<K: Into<String>, V: Into<Attr>>(mut self, name: K, value: V) -> Self {
        self.insert_attr(name, value);
        self
    }

    /// 按名称获取条目.
    pub fn get(&self, name: &str) -> Option<&Entry<T>> {
        self.entries
            .iter()
            .find_map(|(k, e)| (k == name).then_some(e))
    }

    /// 按名称获取影像条目. 不存在或不是影像条目时返回 `None`.
    #[inline]
    pub fn image(&self, name: &str) -> Option<&ImageEntry<T>> {
        self.get(name)?.as_image()
    }

    /// 按名称获取非影像条目. 不存在或不是非影像条目时返回 `None`.
    #[inline]
    pub fn attr(&self, name: &str) -> Option<&Arc<Attr>> {
        self.get(name)?.as_attr()
    }

    /// 是否包含名为 `name` 的条目.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 按插入顺序迭代所有名称.
    #[inline]
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// 按插入顺序迭代所有条目.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Entry<T>)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// 按插入顺序迭代所有影像条目.
    #[inline]
    pub fn images(&self) -> impl Iterator<Item = (&str, &ImageEntry<T>)> {
        self.entries
            .iter()
            .filter_map(|(k, e)| e.as_image().map(|img| (k.as_str(), img)))
    }

    /// 条目个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空样本.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 样本的空间形状. 等价于 [`check_consistent_shape`].
    #[inline]
    pub fn spatial_shape(&self) -> SampleResult<Idx3d> {
        check_consistent_shape(self)
    }
}

/// 检查样本中所有影像条目的空间形状是否一致, 并返回该形状.
///
/// 以第一个影像条目为参照; 通道数不参与比较. 没有影像条目时返回
/// [`SampleError::NoImage`].
pub fn check_consistent_shape<T>(sample: &Sample<T>) -> SampleResult<Idx3d> {
    let mut images = sample.images();
    let (reference, first) = images.next().ok_or(SampleError::NoImage)?;
    let expected = first.spatial_shape();

    for (name, img) in images {
        let found = img.spatial_shape();
        if found != expected {
            return Err(SampleError::ShapeMismatch {
                reference: reference.to_owned(),
                name: name.to_owned(),
                expected,
                found,
            });
        }
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeros(c: usize, shape: Idx3d) -> ImageEntry<f32> {
        let (h, w, d) = shape;
        ImageEntry::intensity(Array4::zeros((c, h, w, d)))
    }

    #[test]
    fn test_insert_keeps_order_and_replaces_in_place() {
        let mut sample = Sample::new()
            .with_image("t1", zeros(1, (4, 4, 4)))
            .with_attr("subject", "sub-01")
            .with_image("seg", zeros(1, (4, 4, 4)));
        assert_eq!(sample.keys().collect::<Vec<_>>(), ["t1", "subject", "seg"]);

        let old = sample.insert_attr("subject", "sub-02");
        assert!(old.is_some_and(|e| !e.is_image()));
        assert_eq!(sample.keys().collect::<Vec<_>>(), ["t1", "subject", "seg"]);
        assert_eq!(
            sample.attr("subject").map(|a| a.as_ref()),
            Some(&Attr::Text("sub-02".to_string()))
        );
        assert_eq!(sample.len(), 3);
        assert!(sample.image("subject").is_none());
        assert!(sample.attr("t1").is_none());
        assert!(!sample.contains("t2"));
    }

    #[test]
    fn test_image_entry_shape() {
        let img = zeros(3, (5, 6, 7)).with_meta("spacing", vec![1.0, 1.0, 2.5]);
        assert_eq!(img.channels(), 3);
        assert_eq!(img.spatial_shape(), (5, 6, 7));
        assert_eq!(img.kind(), ImageKind::Intensity);
        assert_eq!(img.meta()["spacing"], Attr::Floats(vec![1.0, 1.0, 2.5]));

        let lab = ImageEntry::from_array3(ImageKind::Label, Array3::<u8>::zeros((5, 6, 7)));
        assert_eq!(lab.channels(), 1);
        assert_eq!(lab.spatial_shape(), (5, 6, 7));
        assert_eq!(lab.kind(), ImageKind::Label);
    }

    #[test]
    fn test_consistent_shape_ignores_channels() {
        let sample = Sample::new()
            .with_image("t1", zeros(1, (10, 12, 14)))
            .with_attr("age", 42_i64)
            .with_image("dwi", zeros(6, (10, 12, 14)));
        assert_eq!(check_consistent_shape(&sample), Ok((10, 12, 14)));
        assert_eq!(sample.spatial_shape(), Ok((10, 12, 14)));
    }

    #[test]
    fn test_shape_mismatch() {
        let sample = Sample::new()
            .with_image("t1", zeros(1, (10, 10, 10)))
            .with_image("t2", zeros(1, (10, 10, 10)))
            .with_image("seg", zeros(1, (10, 9, 10)));
        assert_eq!(
            check_consistent_shape(&sample),
            Err(SampleError::ShapeMismatch {
                reference: "t1".to_string(),
                name: "seg".to_string(),
                expected: (10, 10, 10),
                found: (10, 9, 10),
            })
        );
    }

    #[test]
    fn test_no_image() {
        let sample = Sample::<f32>::new().with_attr("subject", "sub-01");
        assert_eq!(check_consistent_shape(&sample), Err(SampleError::NoImage));
        assert_eq!(
            check_consistent_shape(&Sample::<f32>::new()),
            Err(SampleError::NoImage)
        );
    }
}
