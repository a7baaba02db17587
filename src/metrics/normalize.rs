//! Conversion of raw runtime counters into [`NormalizedMetrics`].
//!
//! A [`RawFrame`] is the fixed-schema view of one stats sample, validated once at the stream
//! boundary (see [`crate::docker::StatsFrame`]). [`normalize`] is pure: the same frame always
//! yields the same record.
//!
//! # Zero guards
//!
//! - `cpu_percent` is `0` when either counter of the previous sample is `0`. This is the case
//!   for the very first sample of a container.
//! - `memory_percent` is `0` when the memory usage is `0`.
//!
//! Neither percentage is ever `NaN` or infinite.

use crate::container::ContainerID;

use super::record::NormalizedMetrics;

/// One raw stats sample for a single container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFrame {
    /// Container name as reported by the runtime.
    pub name: String,
    /// Total CPU time consumed by the container (nanoseconds).
    pub cpu_total_usage: u64,
    /// Total CPU time of the host (nanoseconds).
    pub system_cpu_usage: u64,
    /// `cpu_total_usage` of the previous sample.
    pub precpu_total_usage: u64,
    /// `system_cpu_usage` of the previous sample.
    pub precpu_system_usage: u64,
    /// Current memory usage in bytes.
    pub memory_usage: u64,
    /// Memory limit in bytes.
    pub memory_limit: u64,
}

/// Normalizes `frame` into the published schema for container `id`.
///
/// # Examples
///
/// ```
/// # use dockwatch::container::ContainerID;
/// # use dockwatch::metrics::{normalize, RawFrame};
/// let frame = RawFrame {
///     name: "/web".to_owned(),
///     cpu_total_usage: 50,
///     system_cpu_usage: 200,
///     precpu_total_usage: 10,
///     precpu_system_usage: 100,
///     memory_usage: 256,
///     memory_limit: 1024,
/// };
/// let metrics = normalize(&ContainerID::new("abc").unwrap(), &frame);
/// assert_eq!(metrics.name, "web");
/// assert_eq!(metrics.cpu_percent, 25.0);
/// assert_eq!(metrics.memory_percent, 25.0);
/// ```
pub fn normalize(id: &ContainerID, frame: &RawFrame) -> NormalizedMetrics {
    NormalizedMetrics {
        id: id.clone(),
        name: frame.name.trim_start_matches('/').to_owned(),
        cpu_percent: cpu_percent(frame),
        memory_usage: frame.memory_usage,
        memory_limit: frame.memory_limit,
        memory_percent: memory_percent(frame),
    }
}

fn cpu_percent(frame: &RawFrame) -> f64 {
    if frame.precpu_total_usage == 0 || frame.precpu_system_usage == 0 {
        return 0.0;
    }
    percent(frame.cpu_total_usage, frame.system_cpu_usage)
}

fn memory_percent(frame: &RawFrame) -> f64 {
    if frame.memory_usage == 0 {
        return 0.0;
    }
    percent(frame.memory_usage, frame.memory_limit)
}

/// `part / whole * 100`, or `0` if `whole` is `0`.
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64) * 100.0
}
