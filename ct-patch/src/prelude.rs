//! 🧩欢迎光临🎲
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::sample::{check_consistent_shape, Attr, Entry, ImageEntry, ImageKind, Sample, Volume};

pub use crate::config::{CopyPolicy, PatchSize};
pub use crate::crop::{copy_and_crop, Patch};
pub use crate::index::select_indices;
pub use crate::pad::{pad, pad_sample, Padding, PaddingMode};
pub use crate::stream::{PatchIter, PatchSampler};

pub use crate::io::{read_nifti, read_npy};
pub use crate::rng::{seed_global, GlobalRng};

pub use crate::{ConfigError, LoadError, LoadResult, SampleError, SampleResult};
