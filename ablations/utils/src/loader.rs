//! 对 `ct-patch::io` 的更一层封装. 提供更直接的样本加载器.

use ct_patch::prelude::*;
use ndarray::Array4;
use std::env;
use std::path::{Path, PathBuf};

/// 获取 `$HOME/dataset` 下的子路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 获取实验样本路径.
///
/// 1. 若环境变量 `$CT_PATCH_SAMPLE` 非空, 则返回其值;
/// 2. 否则, 若 `$HOME/dataset/patch/t1.nii.gz` 存在, 则返回该路径;
/// 3. 否则返回 `None`.
pub fn sample_path_from_env_or_home() -> Option<PathBuf> {
    match env::var("CT_PATCH_SAMPLE") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(["patch", "t1.nii.gz"]).filter(|p| p.is_file()),
    }
}

/// 从 nifti 文件加载只含一个强度影像 `t1` 的样本.
pub fn load_sample<P: AsRef<Path>>(path: P) -> LoadResult<Sample<f32>> {
    let path = path.as_ref();
    let t1 = ImageEntry::open(path, ImageKind::Intensity)?;
    let subject = path
        .file_name()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    Ok(Sample::new()
        .with_image("t1", t1)
        .with_attr("subject", subject))
}

/// 人工合成的样本: 强度影像 `t1` 为一个居中的亮球, 标签 `seg` 为球内区域.
pub fn phantom(shape: Idx3d, radius: f32) -> Sample<f32> {
    let (h, w, d) = shape;
    let center = [h, w, d].map(|n| (n as f32 - 1.0) / 2.0);
    let inside = |i: usize, j: usize, k: usize| {
        let r2 = [i, j, k]
            .iter()
            .zip(center)
            .map(|(&x, c)| (x as f32 - c).powi(2))
            .sum::<f32>();
        r2 <= radius * radius
    };

    let t1 = Array4::from_shape_fn((1, h, w, d), |(_, i, j, k)| {
        if inside(i, j, k) {
            1000.0
        } else {
            -100.0
        }
    });
    let seg = Array4::from_shape_fn((1, h, w, d), |(_, i, j, k)| {
        f32::from(u8::from(inside(i, j, k)))
    });

    Sample::new()
        .with_image("t1", ImageEntry::intensity(t1))
        .with_image("seg", ImageEntry::label(seg))
        .with_attr("subject", "phantom")
}
