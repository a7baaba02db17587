//! Process configuration, read once from the environment at startup.
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::docker::DEFAULT_SOCKET;
use crate::metrics::DEFAULT_METRICS_TOPIC;

pub const DEFAULT_REDIS_ADDR: &str = "host.docker.internal:6379";
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("environment variable `{name}` is not valid unicode")]
    NotUnicode { name: &'static str },
    #[error("environment variable `{name}` has invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `DOCKER_SOCKET`
    pub docker_socket: PathBuf,
    /// `REDIS_ADDR`, as `host:port`.
    pub redis_addr: String,
    /// `METRICS_TOPIC`
    pub metrics_topic: String,
    /// `TRACKER_INTERVAL_MS`
    pub tracker_interval: Duration,
    /// `SNAPSHOT_INTERVAL_MS`
    pub snapshot_interval: Duration,
    /// `CHANNEL_CAPACITY`, bound of the metrics channel.
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docker_socket: PathBuf::from(DEFAULT_SOCKET),
            redis_addr: DEFAULT_REDIS_ADDR.to_owned(),
            metrics_topic: DEFAULT_METRICS_TOPIC.to_owned(),
            tracker_interval: DEFAULT_INTERVAL,
            snapshot_interval: DEFAULT_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Reads the configuration through `lookup`; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<OsString>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(socket) = lookup("DOCKER_SOCKET") {
            config.docker_socket = PathBuf::from(socket);
        }
        if let Some(addr) = string(&lookup, "REDIS_ADDR")? {
            config.redis_addr = addr;
        }
        if let Some(topic) = string(&lookup, "METRICS_TOPIC")? {
            config.metrics_topic = topic;
        }
        if let Some(interval) = millis(&lookup, "TRACKER_INTERVAL_MS")? {
            config.tracker_interval = interval;
        }
        if let Some(interval) = millis(&lookup, "SNAPSHOT_INTERVAL_MS")? {
            config.snapshot_interval = interval;
        }
        if let Some(capacity) = positive(&lookup, "CHANNEL_CAPACITY")? {
            config.channel_capacity = capacity as usize;
        }
        Ok(config)
    }
}

fn string(
    lookup: &impl Fn(&'static str) -> Option<OsString>,
    name: &'static str,
) -> Result<Option<String>> {
    lookup(name)
        .map(|value| value.into_string().map_err(|_| Error::NotUnicode { name }))
        .transpose()
}

/// Parses a strictly positive integer; zero would stall a channel or spin an interval.
fn positive(
    lookup: &impl Fn(&'static str) -> Option<OsString>,
    name: &'static str,
) -> Result<Option<u64>> {
    let Some(value) = string(lookup, name)? else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(0) => Err(Error::Invalid {
            name,
            value,
            reason: "must be greater than zero",
        }),
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(Error::Invalid {
            name,
            value,
            reason: "not a non-negative integer",
        }),
    }
}

fn millis(
    lookup: &impl Fn(&'static str) -> Option<OsString>,
    name: &'static str,
) -> Result<Option<Duration>> {
    Ok(positive(lookup, name)?.map(Duration::from_millis))
}
