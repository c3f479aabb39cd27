//! 运行时错误.
//!
//! 所有错误都是同步产生的, 且都属于调用方编程错误或输入数据畸形, 不应重试.

use std::convert::Infallible;

use thiserror::Error;

use crate::Idx3d;

/// 配置项 (patch 大小, 填充边界, 填充模式) 不合法.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 给定的值个数不被接受.
    ///
    /// `expected` 描述可接受的个数, `found` 为实际个数.
    #[error("Expected {expected} values, got {found}")]
    Arity {
        /// 可接受的个数, 如 `"1 or 3"`.
        expected: &'static str,
        /// 实际个数.
        found: usize,
    },

    /// patch 大小在某个维度上为 0.
    #[error("Patch size must be positive in every dimension, got {0:?}")]
    NonPositive(Idx3d),

    /// 无法将文本解析为非负整数.
    #[error("Cannot parse `{0}` as a non-negative integer")]
    Parse(String),

    /// 未知的填充模式.
    #[error(
        "Padding mode \"{0}\" not valid. Valid options are \
         constant, reflect, mirror, edge, replicate, circular, wrap"
    )]
    PaddingMode(String),
}

/// 从样本中提取 patch 时的错误.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    /// 配置错误.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 同一样本中的影像条目空间形状不一致. 通道数不参与比较.
    #[error(
        "Image `{name}` has spatial shape {found:?}, \
         but reference image `{reference}` has {expected:?}"
    )]
    ShapeMismatch {
        /// 作为参照的影像条目 (样本中的第一个影像条目).
        reference: String,
        /// 形状不一致的影像条目.
        name: String,
        /// 参照形状.
        expected: Idx3d,
        /// 实际形状.
        found: Idx3d,
    },

    /// patch 在某个维度上比体数据大.
    #[error("Patch size {patch_size:?} must not be larger than image size {shape:?}")]
    OutOfBounds {
        /// 请求的 patch 大小.
        patch_size: Idx3d,
        /// 体数据的空间形状.
        shape: Idx3d,
    },

    /// 裁剪区间 `[index_ini, index_fin)` 不在体数据内, 或起点大于终点.
    #[error("Crop range {index_ini:?}..{index_fin:?} is invalid for image size {shape:?}")]
    InvalidRange {
        /// 裁剪起点.
        index_ini: Idx3d,
        /// 裁剪终点 (不含).
        index_fin: Idx3d,
        /// 体数据的空间形状.
        shape: Idx3d,
    },

    /// 样本中没有任何影像条目, 无法确定空间形状.
    #[error("Sample contains no image entry")]
    NoImage,
}

impl From<Infallible> for SampleError {
    #[inline]
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

/// 读取体数据文件时的错误.
#[derive(Error, Debug)]
pub enum LoadError {
    /// 读取 nifti 文件错误.
    #[error("Nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 读取 npy 文件错误.
    #[error("Npy error: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),

    /// 体数据维数既不是 3 也不是 4.
    #[error("Expected a 3D or 4D volume, got {0} dimensions")]
    Rank(usize),

    /// 维数转换失败.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// patch 提取运行时错误.
pub type SampleResult<T> = Result<T, SampleError>;

/// 体数据读取错误.
pub type LoadResult<T> = Result<T, LoadError>;
