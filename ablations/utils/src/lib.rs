//! 消融实验依赖的通用组件.

use std::env;
use std::str::FromStr;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 从环境变量 `key` 中解析一个值. 变量未设置时返回 `default`.
///
/// # 注意
///
/// 变量已设置但无法解析时, 程序 panic.
pub fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(s) => s
            .parse()
            .unwrap_or_else(|e| panic!("Invalid ${key} = {s:?}: {e}")),
        Err(_) => default,
    }
}
