use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::container::ContainerID;

use super::collector::CollectorExit;

/// Reason attached to every [`DeletionEvent`].
pub const DELETION_REASON: &str = "deleted";

/// Normalized usage figures for one container, derived from a single raw stats frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMetrics {
    pub id: ContainerID,
    pub name: String,
    /// CPU usage in percent, never negative.
    pub cpu_percent: f64,
    /// Memory usage in bytes, as reported by the runtime.
    pub memory_usage: u64,
    /// Memory limit in bytes, as reported by the runtime.
    pub memory_limit: u64,
    /// Memory usage relative to the limit in percent, never negative.
    pub memory_percent: f64,
}

/// Notice that a container is gone and its collector has been retired.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DeletionEvent {
    pub id: ContainerID,
    pub reason: &'static str,
}

impl DeletionEvent {
    pub fn new(id: ContainerID) -> Self {
        Self {
            id,
            reason: DELETION_REASON,
        }
    }
}

/// The payload shapes that are published to the bus.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum OutboundRecord {
    Metrics(NormalizedMetrics),
    Deletion(DeletionEvent),
}

impl OutboundRecord {
    pub fn id(&self) -> &ContainerID {
        match self {
            OutboundRecord::Metrics(metrics) => &metrics.id,
            OutboundRecord::Deletion(deletion) => &deletion.id,
        }
    }
}

impl From<NormalizedMetrics> for OutboundRecord {
    fn from(value: NormalizedMetrics) -> Self {
        Self::Metrics(value)
    }
}

impl From<DeletionEvent> for OutboundRecord {
    fn from(value: DeletionEvent) -> Self {
        Self::Deletion(value)
    }
}

/// A tracked container: the token that stops its collector and the collector task itself.
#[derive(Debug)]
pub struct ResourceHandle {
    id: ContainerID,
    cancel: CancellationToken,
    task: JoinHandle<CollectorExit>,
}

impl ResourceHandle {
    pub(super) fn new(
        id: ContainerID,
        cancel: CancellationToken,
        task: JoinHandle<CollectorExit>,
    ) -> Self {
        Self { id, cancel, task }
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }

    /// Returns `true` once the collector task has exited, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the collector to stop and hands back its task so callers may await it.
    pub(super) fn cancel(self) -> JoinHandle<CollectorExit> {
        self.cancel.cancel();
        self.task
    }
}
