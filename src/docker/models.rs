//! Typed views of the Docker Engine API responses this crate consumes.
//!
//! Only the fields that are actually used are modelled; everything else in the daemon's
//! responses is ignored during deserialization.

use crate::metrics::RawFrame;

/// One entry of `GET /containers/json`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "ImageID", default)]
    pub image_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ports: Vec<Port>,
}

/// A port mapping, serialized back out exactly as the daemon reports it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Port {
    #[serde(rename = "IP", default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(rename = "PrivatePort")]
    pub private_port: u16,
    #[serde(rename = "PublicPort", default, skip_serializing_if = "Option::is_none")]
    pub public_port: Option<u16>,
    #[serde(rename = "Type")]
    pub kind: String,
}

/// One entry of `GET /images/json`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageSummary {
    pub id: String,
    /// `null` for dangling images.
    #[serde(default)]
    pub repo_tags: Option<Vec<String>>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub size: i64,
}

/// One frame of `GET /containers/{id}/stats?stream=true`.
///
/// `cpu_stats` and `precpu_stats` must be present; a frame without them is rejected as
/// malformed. Counters the daemon omits (e.g. for a stopped container) default to `0`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct StatsFrame {
    #[serde(default)]
    pub name: String,
    pub cpu_stats: CpuStats,
    pub precpu_stats: CpuStats,
    #[serde(default)]
    pub memory_stats: MemoryStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize)]
pub struct CpuStats {
    #[serde(default)]
    pub cpu_usage: CpuUsage,
    #[serde(default)]
    pub system_cpu_usage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize)]
pub struct CpuUsage {
    #[serde(default)]
    pub total_usage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize)]
pub struct MemoryStats {
    #[serde(default)]
    pub usage: u64,
    #[serde(default)]
    pub limit: u64,
}

impl From<StatsFrame> for RawFrame {
    fn from(value: StatsFrame) -> Self {
        RawFrame {
            name: value.name,
            cpu_total_usage: value.cpu_stats.cpu_usage.total_usage,
            system_cpu_usage: value.cpu_stats.system_cpu_usage,
            precpu_total_usage: value.precpu_stats.cpu_usage.total_usage,
            precpu_system_usage: value.precpu_stats.system_cpu_usage,
            memory_usage: value.memory_stats.usage,
            memory_limit: value.memory_stats.limit,
        }
    }
}
