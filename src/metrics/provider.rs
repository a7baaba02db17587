use crate::container::ContainerID;

use super::normalize::RawFrame;

/// Source of the current set of live containers.
pub trait InventoryProvider: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn list(&self)
    -> impl std::future::Future<Output = Result<Vec<ContainerID>, Self::Error>> + Send;
}

/// Opens a continuous stream of raw stats frames for one container.
pub trait StatsProvider: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;
    type Stream: MetricStream;

    fn open(
        &self,
        id: &ContainerID,
    ) -> impl std::future::Future<Output = Result<Self::Stream, Self::Error>> + Send;
}

/// A stream of raw frames; dropping it releases the underlying connection.
pub trait MetricStream: Send + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the next decoded frame, or `None` once the stream has ended.
    fn next_frame(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<RawFrame>, Self::Error>> + Send;
}

/// Fire-and-forget publishing of a payload under a topic.
pub trait MessageBus: Send + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;
}
