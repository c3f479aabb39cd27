//! patch 起点覆盖率实验.
//!
//! 在一个样本上连续拉取若干 patch, 统计每个空间轴上裁剪起点的分布,
//! 检查其是否覆盖 `[0, shape - patch_size]` 的全部取值并近似均匀.
//!
//! 可用环境变量:
//!
//! 1. `$CT_PATCH_SAMPLE`: nifti 样本路径. 未设置时尝试 `$HOME/dataset/patch/t1.nii.gz`,
//!   仍不存在则使用人工合成的样本;
//! 2. `$CT_PATCH_SIZE`: patch 大小, 如 `32` 或 `64x64x32`, 默认 `32`;
//! 3. `$CT_PATCH_PULLS`: 拉取次数, 默认 `1000`;
//! 4. `$CT_PATCH_SEED`: 随机种子, 默认 `0`.

mod result;
mod runner;

fn main() {
    simple_logger::init_with_level(log::Level::Info).unwrap();
    runner::run().analyze();
}
