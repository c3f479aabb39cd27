//! 单样本上的无限 patch 流.

use std::iter::FusedIterator;
use std::sync::Arc;

use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::rng::GlobalRng;
use crate::{
    check_consistent_shape, copy_and_crop, select_indices, CopyPolicy, Patch, PatchSize, Sample,
    SampleError, SampleResult,
};

/// 在一个样本上按固定 patch 大小随机裁剪的采样器.
///
/// 采样器本身只持有不可变的 `(样本, patch 大小, 复制策略)`, 不保存任何游标状态.
/// 每次调用 [`PatchSampler::iter`] 等方法都会得到一条独立的无限流.
///
/// 构造时只校验 patch 大小. 形状一致性和越界检查在每次拉取时进行, 不做缓存,
/// 因此不合法的样本会在第一次拉取时报错, 而不是在构造时.
#[derive(Debug)]
pub struct PatchSampler<T> {
    sample: Arc<Sample<T>>,
    patch_size: PatchSize,
    policy: CopyPolicy,
}

impl<T> Clone for PatchSampler<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            sample: Arc::clone(&self.sample),
            patch_size: self.patch_size,
            policy: self.policy,
        }
    }
}

impl<T> PatchSampler<T> {
    /// 在 `sample` 上以 `patch_size` 构建采样器.
    ///
    /// `patch_size` 可以是单个整数 (立方体), 三元组, 长度为 1 或 3 的切片,
    /// 或已经构造好的 [`PatchSize`]. 不合法时返回 [`SampleError::Config`].
    pub fn new<P>(sample: Sample<T>, patch_size: P) -> SampleResult<Self>
    where
        P: TryInto<PatchSize>,
        SampleError: From<P::Error>,
    {
        Self::from_shared(Arc::new(sample), patch_size)
    }

    /// 与 [`PatchSampler::new`] 相同, 但样本已被共享持有.
    pub fn from_shared<P>(sample: Arc<Sample<T>>, patch_size: P) -> SampleResult<Self>
    where
        P: TryInto<PatchSize>,
        SampleError: From<P::Error>,
    {
        let patch_size = patch_size.try_into()?;
        debug!(
            "Patch sampler over {} entries, patch size {patch_size}",
            sample.len()
        );
        Ok(Self {
            sample,
            patch_size,
            policy: CopyPolicy::default(),
        })
    }

    /// 设置复制策略.
    #[inline]
    pub fn with_policy(mut self, policy: CopyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 底层样本.
    #[inline]
    pub fn sample(&self) -> &Sample<T> {
        &self.sample
    }

    /// patch 大小.
    #[inline]
    pub fn patch_size(&self) -> PatchSize {
        self.patch_size
    }

    /// 复制策略.
    #[inline]
    pub fn policy(&self) -> CopyPolicy {
        self.policy
    }
}

impl<T: Clone> PatchSampler<T> {
    /// 拉取一个 patch: 形状一致性检查 -> 索引选取 -> 裁剪与复制.
    pub fn extract_patch<R: Rng + ?Sized>(&self, rng: &mut R) -> SampleResult<Patch<T>> {
        let shape = check_consistent_shape(&self.sample)?;
        let (index_ini, index_fin) = select_indices(shape, self.patch_size.as_idx(), rng)?;
        trace!("Cropping {index_ini:?}..{index_fin:?} out of {shape:?}");
        copy_and_crop(&self.sample, index_ini, index_fin, self.policy)
    }

    /// 使用进程级共享生成器的无限流.
    #[inline]
    pub fn iter(&self) -> PatchIter<T, GlobalRng> {
        self.iter_with(GlobalRng)
    }

    /// 使用给定生成器的无限流. 流独占该生成器.
    #[inline]
    pub fn iter_with<R: Rng>(&self, rng: R) -> PatchIter<T, R> {
        PatchIter {
            sampler: self.clone(),
            rng,
            pulls: 0,
        }
    }

    /// 使用以 `seed` 初始化的 `ChaCha8Rng` 的无限流. 相同种子得到相同的 patch 序列.
    #[inline]
    pub fn iter_seeded(&self, seed: u64) -> PatchIter<T, ChaCha8Rng> {
        self.iter_with(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<T: Clone> IntoIterator for &PatchSampler<T> {
    type Item = SampleResult<Patch<T>>;
    type IntoIter = PatchIter<T, GlobalRng>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 无限 patch 流.
///
/// `next()` 永远不返回 `None`. 拉取失败时产出 `Some(Err(..))`, 流本身仍可继续使用,
/// 但只要底层样本不变, 之后的拉取仍会以同样的方式失败.
///
/// 流持有采样器的一份廉价克隆和自己的生成器, 与其它流不共享任何游标状态.
/// 丢弃流即可停止生成.
#[derive(Debug)]
pub struct PatchIter<T, R> {
    sampler: PatchSampler<T>,
    rng: R,
    pulls: u64,
}

impl<T, R> PatchIter<T, R> {
    /// 已拉取的 patch 个数 (包括失败的拉取).
    #[inline]
    pub fn pulls(&self) -> u64 {
        self.pulls
    }

    /// 所属采样器.
    #[inline]
    pub fn sampler(&self) -> &PatchSampler<T> {
        &self.sampler
    }
}

impl<T: Clone, R: Rng> Iterator for PatchIter<T, R> {
    type Item = SampleResult<Patch<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pulls += 1;
        let patch = self.sampler.extract_patch(&mut self.rng);
        if let Err(e) = &patch {
            warn!("Pull #{} failed: {e}", self.pulls);
        }
        Some(patch)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<T: Clone, R: Rng> FusedIterator for PatchIter<T, R> {}
