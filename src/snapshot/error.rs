type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of a single snapshot cycle. The feed logs them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Docker(#[from] crate::docker::Error),
    #[error("failed to serialize snapshot: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("failed to publish snapshot: {0}")]
    Publish(#[source] BoxError),
}

pub type Result<T> = std::result::Result<T, Error>;
