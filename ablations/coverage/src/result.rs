//! 实验结果.

use itertools::{Itertools, MinMaxResult};
use std::collections::HashSet;
use std::io::{self, Write};
use std::time::Duration;

/// 单个空间轴上的起点分布.
pub struct AxisCoverage {
    max_origin: usize,
    pulls: usize,
    min: Option<usize>,
    max: Option<usize>,
    mean: Option<f64>,
    distinct: usize,
}

impl AxisCoverage {
    /// 从该轴上的全部起点统计. 合法起点为 `[0, max_origin]`.
    pub fn new(max_origin: usize, origins: &[usize]) -> Self {
        let (min, max) = match origins.iter().copied().minmax() {
            MinMaxResult::NoElements => (None, None),
            MinMaxResult::OneElement(v) => (Some(v), Some(v)),
            MinMaxResult::MinMax(a, b) => (Some(a), Some(b)),
        };
        let mean = (!origins.is_empty())
            .then(|| origins.iter().sum::<usize>() as f64 / origins.len() as f64);
        Self {
            max_origin,
            pulls: origins.len(),
            min,
            max,
            mean,
            distinct: origins.iter().collect::<HashSet<_>>().len(),
        }
    }

    /// 均匀分布下的期望起点.
    #[inline]
    pub fn expected_mean(&self) -> f64 {
        self.max_origin as f64 / 2.0
    }
}

/// 将 `c` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, c: &AxisCoverage, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    #[inline]
    fn usize_to_display(u: Option<usize>) -> String {
        match u {
            Some(u) => u.to_string(),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Axis `{name}`:")?;
    writeln!(w, "{S4}Valid origins: [0, {}]", c.max_origin)?;
    writeln!(w, "{S4}Min origin: {}", usize_to_display(c.min))?;
    writeln!(w, "{S4}Max origin: {}", usize_to_display(c.max))?;
    writeln!(w, "{S4}Mean origin: {}", f64_to_display(c.mean))?;
    writeln!(w, "{S4}Expected mean: {:.6}", c.expected_mean())?;
    write!(
        w,
        "{S4}Distinct origins: {} of {} ({} pulls)",
        c.distinct,
        c.max_origin + 1,
        c.pulls
    )?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    elapsed: Duration,
    data: Vec<(&'static str, AxisCoverage)>,
}

impl AblationResult {
    pub fn new<I: IntoIterator<Item = (&'static str, AxisCoverage)>>(
        elapsed: Duration,
        it: I,
    ) -> Self {
        Self {
            elapsed,
            data: it.into_iter().collect(),
        }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for (key, coverage) in self.data.iter() {
            describe_into(key, coverage, &mut buf).unwrap();
            println!("{}", std::str::from_utf8(&buf).unwrap());
            buf.clear();

            utils::sep();
        }

        let pulls = self.data.first().map_or(0, |(_, c)| c.pulls);
        println!("Total machine time: {} us", self.elapsed.as_micros());
        if pulls > 0 {
            println!(
                "Average time: {:.3} us per patch",
                self.elapsed.as_secs_f64() * 1e6 / pulls as f64
            );
        }
        utils::sep();
    }
}
