//! 裁剪与复制.

use std::ops::Deref;
use std::sync::Arc;

use ndarray::{ArrayBase, Axis, Dimension, RawData, Slice};

use crate::sample::{Attr, Entry, ImageEntry, Sample};
use crate::{idx3d_to_array, CopyPolicy, Idx3d, SampleError, SampleResult};

/// 沿最后三个轴将 `array` 收窄到 `[index_ini, index_fin)`, 其余轴 (通道轴等) 保持不变.
///
/// 对视图和 `ArcArray` 而言这是零拷贝操作; 对 owned 数组, 底层缓冲区整体保留.
///
/// # 注意
///
/// `array` 至少要有三个轴, 且区间必须落在对应轴内, 否则程序 panic.
pub fn crop<S, D>(
    mut array: ArrayBase<S, D>,
    index_ini: Idx3d,
    index_fin: Idx3d,
) -> ArrayBase<S, D>
where
    S: RawData,
    D: Dimension,
{
    let n = array.ndim();
    assert!(n >= 3, "Cannot crop an array with {n} axes");

    let ini = idx3d_to_array(index_ini);
    let fin = idx3d_to_array(index_fin);
    for k in 0..3 {
        array.slice_axis_inplace(Axis(n - 3 + k), Slice::from(ini[k]..fin[k]));
    }
    array
}

/// 检查 `[index_ini, index_fin)` 是否是空间形状 `shape` 内的合法区间.
fn check_range(shape: Idx3d, index_ini: Idx3d, index_fin: Idx3d) -> SampleResult<()> {
    let sh = idx3d_to_array(shape);
    let ini = idx3d_to_array(index_ini);
    let fin = idx3d_to_array(index_fin);
    if (0..3).all(|k| ini[k] <= fin[k] && fin[k] <= sh[k]) {
        Ok(())
    } else {
        Err(SampleError::InvalidRange {
            index_ini,
            index_fin,
            shape,
        })
    }
}

impl<T: Clone> ImageEntry<T> {
    /// 复制元信息, 并以裁剪后的体数据替换原体数据.
    pub(crate) fn cropped(&self, index_ini: Idx3d, index_fin: Idx3d, policy: CopyPolicy) -> Self {
        let view = crop(self.data().clone(), index_ini, index_fin);
        let data = match policy {
            CopyPolicy::Shared => view,
            CopyPolicy::Deep => view.as_standard_layout().into_owned().into_shared(),
        };
        self.with_data(data)
    }
}

impl CopyPolicy {
    /// 按策略复制非影像条目.
    #[inline]
    pub(crate) fn copy_attr(&self, attr: &Arc<Attr>) -> Arc<Attr> {
        match self {
            Self::Shared => Arc::clone(attr),
            Self::Deep => Arc::new(attr.as_ref().clone()),
        }
    }
}

/// 从样本中裁剪出的 patch.
///
/// 与原样本键集合、键顺序完全相同; 每个影像条目的空间形状等于 patch 大小.
/// 另外携带裁剪起点 `index_ini` (以及终点 `index_fin`).
///
/// 通过 `Deref` 可以直接当作 [`Sample`] 使用.
#[derive(Clone, Debug)]
pub struct Patch<T> {
    sample: Sample<T>,
    index_ini: Idx3d,
    index_fin: Idx3d,
}

impl<T> Patch<T> {
    /// 裁剪起点.
    #[inline]
    pub fn index_ini(&self) -> Idx3d {
        self.index_ini
    }

    /// 裁剪终点 (不含).
    #[inline]
    pub fn index_fin(&self) -> Idx3d {
        self.index_fin
    }

    /// 获得裁剪后的样本.
    #[inline]
    pub fn sample(&self) -> &Sample<T> {
        &self.sample
    }

    /// 消费自我, 获得裁剪后的样本.
    #[inline]
    pub fn into_sample(self) -> Sample<T> {
        self.sample
    }

    /// 消费自我, 获得 `(样本, index_ini, index_fin)`.
    #[inline]
    pub fn into_parts(self) -> (Sample<T>, Idx3d, Idx3d) {
        (self.sample, self.index_ini, self.index_fin)
    }
}

impl<T> Deref for Patch<T> {
    type Target = Sample<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.sample
    }
}

/// 按 `[index_ini, index_fin)` 裁剪样本中的所有影像条目, 得到一个新的 patch.
///
/// 1. 结果与 `sample` 键集合、键顺序相同.
/// 2. 非影像条目按 `policy` 复制: `Shared` 下与原样本共享同一个 `Arc`.
/// 3. 影像条目复制元信息, 体数据替换为最后三个轴上的裁剪结果, 通道轴不变.
///   `Shared` 下裁剪结果是原缓冲区上的视图, `Deep` 下复制到新缓冲区.
/// 4. 原样本不被修改.
///
/// 任一影像条目容纳不下该区间时返回 [`SampleError::InvalidRange`].
pub fn copy_and_crop<T: Clone>(
    sample: &Sample<T>,
    index_ini: Idx3d,
    index_fin: Idx3d,
    policy: CopyPolicy,
) -> SampleResult<Patch<T>> {
    for (_, img) in sample.images() {
        check_range(img.spatial_shape(), index_ini, index_fin)?;
    }

    let entries = sample
        .iter()
        .map(|(name, entry)| {
            let entry = match entry {
                Entry::Image(img) => Entry::Image(img.cropped(index_ini, index_fin, policy)),
                Entry::Attr(a) => Entry::Attr(policy.copy_attr(a)),
            };
            (name.to_owned(), entry)
        })
        .collect();

    Ok(Patch {
        sample: Sample::from_entries(entries),
        index_ini,
        index_fin,
    })
}
