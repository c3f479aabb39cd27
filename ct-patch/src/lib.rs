#![warn(missing_docs)]

//! 核心库. 从单个已加载的多通道 3D 影像样本中, 以随机空间偏移裁剪固定大小的子体积
//! (patch), 并以无限、可重启的流的形式提供给训练循环.
//!
//! 一个样本 ([`Sample`]) 是名称到条目的映射. 影像条目保存形状为 `(C, H, W, D)`
//! 的体数据 ([`Volume`]), 同一样本内所有影像条目的空间形状 `(H, W, D)` 必须一致,
//! 通道数可以不同. 非影像条目原样传递, 从不裁剪.
//!
//! # 结构
//!
//! 1. [`index`]: 给定体形状和 patch 大小, 随机选取合法的裁剪起点与终点.
//! 2. [`crop`]: 按索引对裁剪样本中每个影像条目的最后三个轴, 并附加 `index_ini`.
//! 3. [`stream`]: 在一个样本上构建无限 patch 流. 每次拉取依次执行形状一致性检查,
//!   索引选取与裁剪.
//! 4. [`pad`]: 将体数据填充到至少能容纳 patch 的大小.
//! 5. [`io`]: 从 nifti / npy 文件读取体数据. 样本的加载本身不属于核心逻辑,
//!   这里只提供便捷入口.
//!
//! # 注意
//!
//! 1. 所有空间坐标统一使用 `usize`, 不做任何窄化.
//! 2. 默认情况下, 非影像条目在所有 patch 之间按引用共享 (见 [`CopyPolicy`]).
//!   调用方应将其视为只读.
//! 3. 随机数生成器可显式传入. 不传入时使用进程级共享的 [`rng::GlobalRng`].
//!
//! # 示例
//!
//! ```no_run
//! use ct_patch::prelude::*;
//! use ndarray::Array4;
//!
//! let t1 = Array4::<f32>::zeros((1, 64, 64, 48));
//! let seg = Array4::<f32>::zeros((1, 64, 64, 48));
//! let sample = Sample::new()
//!     .with_image("t1", ImageEntry::intensity(t1))
//!     .with_image("seg", ImageEntry::label(seg))
//!     .with_attr("subject", "sub-01");
//!
//! let sampler = PatchSampler::new(sample, 32usize).unwrap();
//! for patch in sampler.iter_seeded(42).take(4) {
//!     let patch = patch.unwrap();
//!     assert_eq!(patch.image("t1").unwrap().spatial_shape(), (32, 32, 32));
//! }
//! ```

/// 三维索引, 同时也可一定程度上用作非负整数向量.
///
/// 按 `(h, w, d)` 顺序组织, 与体数据最后三个轴一一对应.
pub type Idx3d = (usize, usize, usize);

/// Idx3d -> [usize; 3]
#[inline]
pub(crate) const fn idx3d_to_array((h, w, d): Idx3d) -> [usize; 3] {
    [h, w, d]
}

/// [usize; 3] -> Idx3d
#[inline]
pub(crate) const fn array_to_idx3d([h, w, d]: [usize; 3]) -> Idx3d {
    (h, w, d)
}

mod error;

pub use error::{ConfigError, LoadError, LoadResult, SampleError, SampleResult};

pub mod config;
pub mod crop;
pub mod index;
pub mod io;
pub mod pad;
pub mod rng;
pub mod sample;
pub mod stream;

pub use config::{CopyPolicy, PatchSize};
pub use crop::{copy_and_crop, Patch};
pub use index::select_indices;
pub use pad::{Padding, PaddingMode};
pub use sample::{check_consistent_shape, Attr, Entry, ImageEntry, ImageKind, Sample, Volume};
pub use stream::{PatchIter, PatchSampler};

pub mod prelude;
