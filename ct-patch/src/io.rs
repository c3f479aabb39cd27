//! 体数据读取.
//!
//! 样本的加载不属于 patch 采样的核心逻辑, 这里只提供从 nifti / npy 文件得到
//! `(C, H, W, D)` 体数据的便捷入口.

use std::path::Path;

use log::debug;
use ndarray::{ArrayD, Axis, Ix3, Ix4};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::sample::{Attr, ImageEntry, ImageKind, Volume};
use crate::{LoadError, LoadResult};

/// 将 nifti 的 `(X, Y, Z)` 或 `(X, Y, Z, C)` 数组转换为 `(C, X, Y, Z)` 体数据.
fn volume_from_nifti_array(data: ArrayD<f32>) -> LoadResult<Volume<f32>> {
    match data.ndim() {
        3 => Ok(data
            .into_dimensionality::<Ix3>()?
            .insert_axis(Axis(0))
            .into_shared()),
        4 => Ok(data
            .into_dimensionality::<Ix4>()?
            .permuted_axes([3, 0, 1, 2])
            .as_standard_layout()
            .into_owned()
            .into_shared()),
        n => Err(LoadError::Rank(n)),
    }
}

/// 将 `(H, W, D)` 或 `(C, H, W, D)` 数组转换为体数据. 四维数组视为已按
/// `(C, H, W, D)` 排列.
fn volume_from_npy_array(data: ArrayD<f32>) -> LoadResult<Volume<f32>> {
    match data.ndim() {
        3 => Ok(data
            .into_dimensionality::<Ix3>()?
            .insert_axis(Axis(0))
            .into_shared()),
        4 => Ok(data.into_dimensionality::<Ix4>()?.into_shared()),
        n => Err(LoadError::Rank(n)),
    }
}

/// 读取 nifti 文件 (`.nii` 或 `.nii.gz`) 为 `f32` 体数据.
///
/// 三维影像得到单通道体数据 `(1, X, Y, Z)`; 四维影像的第四维视为通道,
/// 得到 `(C, X, Y, Z)`. 其它维数返回 [`LoadError::Rank`].
pub fn read_nifti<P: AsRef<Path>>(path: P) -> LoadResult<Volume<f32>> {
    let obj = ReaderOptions::new().read_file(path.as_ref())?;
    volume_from_nifti_array(obj.into_volume().into_ndarray::<f32>()?)
}

/// 读取 `.npy` 文件为 `f32` 体数据.
///
/// 三维数组得到单通道体数据, 四维数组按 `(C, H, W, D)` 原样使用.
pub fn read_npy<P: AsRef<Path>>(path: P) -> LoadResult<Volume<f32>> {
    let data: ArrayD<f32> = ndarray_npy::read_npy(path)?;
    volume_from_npy_array(data)
}

impl ImageEntry<f32> {
    /// 打开 nifti 格式的影像条目. `path` 为本地路径.
    ///
    /// 元信息中记录 `path` (文件路径) 和 `spacing` (体素间距, 毫米).
    pub fn open<P: AsRef<Path>>(path: P, kind: ImageKind) -> LoadResult<Self> {
        let path = path.as_ref();
        let obj = ReaderOptions::new().read_file(path)?;
        let [_, x, y, z, ..] = obj.header().pixdim;
        let data = volume_from_nifti_array(obj.into_volume().into_ndarray::<f32>()?)?;
        debug!("Loaded {} with shape {:?}", path.display(), data.dim());

        Ok(Self::new(kind, data)
            .with_meta("path", Attr::Path(path.to_owned()))
            .with_meta("spacing", vec![x as f64, y as f64, z as f64]))
    }

    /// 打开 npy 格式的影像条目. 元信息中只记录 `path`.
    pub fn open_npy<P: AsRef<Path>>(path: P, kind: ImageKind) -> LoadResult<Self> {
        let path = path.as_ref();
        let data = read_npy(path)?;
        Ok(Self::new(kind, data).with_meta("path", Attr::Path(path.to_owned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array3, Array4, IxDyn};

    #[test]
    fn test_nifti_3d_gets_channel_axis() {
        let a = Array::from_iter((0..24).map(|v| v as f32))
            .into_shape(IxDyn(&[2, 3, 4]))
            .unwrap();
        let v = volume_from_nifti_array(a.clone()).unwrap();
        assert_eq!(v.dim(), (1, 2, 3, 4));
        assert_eq!(v[[0, 1, 2, 3]], a[[1, 2, 3]]);
    }

    #[test]
    fn test_nifti_4d_channel_last_to_first() {
        let a = Array::from_iter((0..48).map(|v| v as f32))
            .into_shape(IxDyn(&[2, 3, 4, 2]))
            .unwrap();
        let v = volume_from_nifti_array(a.clone()).unwrap();
        assert_eq!(v.dim(), (2, 2, 3, 4));
        assert!(v.is_standard_layout());
        assert_eq!(v[[1, 0, 2, 3]], a[[0, 2, 3, 1]]);
    }

    #[test]
    fn test_rank_error() {
        let a = ArrayD::<f32>::zeros(IxDyn(&[2, 2]));
        assert!(matches!(volume_from_nifti_array(a.clone()), Err(LoadError::Rank(2))));
        assert!(matches!(volume_from_npy_array(a), Err(LoadError::Rank(2))));
    }

    #[test]
    fn test_npy_roundtrip_on_disk() {
        let dir = std::env::temp_dir().join(format!("ct-patch-io-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let p3 = dir.join("vol3.npy");
        let a3 = Array3::<f32>::from_elem((4, 5, 6), 1.5);
        ndarray_npy::write_npy(&p3, &a3).unwrap();
        let img = ImageEntry::open_npy(&p3, ImageKind::Intensity).unwrap();
        assert_eq!(img.channels(), 1);
        assert_eq!(img.spatial_shape(), (4, 5, 6));
        assert_eq!(img.meta()["path"], Attr::Path(p3.clone()));

        let p4 = dir.join("vol4.npy");
        let a4 = Array4::<f32>::zeros((3, 4, 5, 6));
        ndarray_npy::write_npy(&p4, &a4).unwrap();
        assert_eq!(read_npy(&p4).unwrap().dim(), (3, 4, 5, 6));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_nifti("/definitely/not/here.nii"),
            Err(LoadError::Nifti(_))
        ));
        assert!(matches!(
            read_npy("/definitely/not/here.npy"),
            Err(LoadError::Npy(_))
        ));
    }
}
