//! 程序运行函数.

use crate::result::{AblationResult, AxisCoverage};
use ct_patch::prelude::*;
use log::info;
use std::time::Instant;
use utils::loader;

/// 实际运行.
pub fn run() -> AblationResult {
    let patch_size: PatchSize =
        utils::env_or("CT_PATCH_SIZE", PatchSize::cube(32).expect("Invalid default size"));
    let pulls: usize = utils::env_or("CT_PATCH_PULLS", 1000);
    let seed: u64 = utils::env_or("CT_PATCH_SEED", 0);

    let mut sample = match loader::sample_path_from_env_or_home() {
        Some(p) => {
            info!("Loading sample from {}", p.display());
            loader::load_sample(&p).unwrap_or_else(|e| panic!("Loading {p:?} error: {e}"))
        }
        None => {
            info!("No sample found, using a synthetic phantom");
            loader::phantom((96, 96, 64), 24.0)
        }
    };

    let shape = check_consistent_shape(&sample).expect("Inconsistent sample");
    let padding = Padding::to_fit(shape, patch_size.as_idx());
    if !padding.is_zero() {
        sample = pad_sample(&sample, &padding, PaddingMode::Constant, 0.0);
    }
    let shape = padding.padded_shape(shape);

    println!(
        "Running coverage study: {pulls} patches of {patch_size} out of {shape:?} on {} cores...",
        utils::cpus()
    );
    let sampler = PatchSampler::new(sample, patch_size).expect("Invalid patch size");

    let mut origins = Vec::with_capacity(pulls);
    let start = Instant::now();
    for patch in sampler.iter_seeded(seed).take(pulls) {
        let patch = patch.unwrap_or_else(|e| panic!("Pulling patch error: {e}"));
        origins.push(patch.index_ini());
    }
    let elapsed = start.elapsed();

    let (sh, ps) = (shape, patch_size.as_idx());
    let axes = [
        ("h", sh.0 - ps.0, origins.iter().map(|o| o.0).collect::<Vec<_>>()),
        ("w", sh.1 - ps.1, origins.iter().map(|o| o.1).collect()),
        ("d", sh.2 - ps.2, origins.iter().map(|o| o.2).collect()),
    ];
    AblationResult::new(
        elapsed,
        axes.into_iter()
            .map(|(name, max_origin, values)| (name, AxisCoverage::new(max_origin, &values))),
    )
}
