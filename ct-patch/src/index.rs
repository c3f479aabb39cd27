//! 随机裁剪索引选取.

use rand::Rng;

use crate::{array_to_idx3d, idx3d_to_array, Idx3d, SampleError, SampleResult};

/// 在空间形状为 `shape` 的体数据中, 为大小为 `patch_size` 的 patch 随机选取裁剪区间.
///
/// 返回 `(index_ini, index_fin)`, 满足 `index_fin = index_ini + patch_size`,
/// 且对每个轴 `0 <= index_ini <= shape - patch_size`.
///
/// # 取数顺序
///
/// 先对三个轴全部做越界检查, 越界时直接返回错误, 不消耗随机数.
/// 然后按轴 `0 -> 1 -> 2` 依次处理: 若该轴上 `shape == patch_size`, 起点固定为 0,
/// 不取数; 否则从 `[0, shape - patch_size]` 中均匀地取一次数.
/// 固定种子时, 该顺序保证结果可复现.
///
/// # 错误
///
/// 任一轴上 `patch_size > shape` 时返回 [`SampleError::OutOfBounds`],
/// 其中同时包含请求的 patch 大小和体数据形状.
pub fn select_indices<R: Rng + ?Sized>(
    shape: Idx3d,
    patch_size: Idx3d,
    rng: &mut R,
) -> SampleResult<(Idx3d, Idx3d)> {
    let sh = idx3d_to_array(shape);
    let ps = idx3d_to_array(patch_size);

    let mut max_origin = [0usize; 3];
    for dim in 0..3 {
        max_origin[dim] = sh[dim]
            .checked_sub(ps[dim])
            .ok_or(SampleError::OutOfBounds { patch_size, shape })?;
    }

    let mut ini = [0usize; 3];
    let mut fin = [0usize; 3];
    for dim in 0..3 {
        ini[dim] = match max_origin[dim] {
            0 => 0,
            m => rng.gen_range(0..=m),
        };
        fin[dim] = ini[dim] + ps[dim];
    }
    Ok((array_to_idx3d(ini), array_to_idx3d(fin)))
}
