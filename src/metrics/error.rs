use crate::container::ContainerID;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures inside the collection pipeline. None of them is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transient; the tracker skips the cycle.
    #[error("failed to list containers: {0}")]
    InventoryList(#[source] BoxError),
    /// Ends the affected collector.
    #[error("failed to open stats stream for container `{id}`: {source}")]
    StreamOpen {
        id: ContainerID,
        #[source]
        source: BoxError,
    },
    /// Ends the affected collector.
    #[error("failed to decode stats frame for container `{id}`: {source}")]
    Decode {
        id: ContainerID,
        #[source]
        source: BoxError,
    },
    /// Drops the affected record.
    #[error("failed to serialize record: {0}")]
    Serialization(#[source] serde_json::Error),
    /// Drops the affected record.
    #[error("failed to publish record: {0}")]
    Publish(#[source] BoxError),
}

pub type Result<T> = std::result::Result<T, Error>;
