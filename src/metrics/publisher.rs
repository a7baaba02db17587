use tokio::sync::mpsc;

use super::error::Error;
use super::provider::MessageBus;
use super::record::{DeletionEvent, OutboundRecord};

/// Default topic shared by all containers' records.
pub const DEFAULT_METRICS_TOPIC: &str = "container_metrics";

/// The single consumer of everything collectors and the tracker produce.
///
/// Records are forwarded in the order they were received. Delivery is at-most-once: a record
/// that fails to serialize or publish is logged and dropped.
pub struct Publisher<B> {
    bus: B,
    topic: String,
    metrics_rx: mpsc::Receiver<OutboundRecord>,
    deletion_rx: mpsc::UnboundedReceiver<DeletionEvent>,
}

impl<B: MessageBus> Publisher<B> {
    pub fn new(
        bus: B,
        topic: impl Into<String>,
        metrics_rx: mpsc::Receiver<OutboundRecord>,
        deletion_rx: mpsc::UnboundedReceiver<DeletionEvent>,
    ) -> Self {
        Self {
            bus,
            topic: topic.into(),
            metrics_rx,
            deletion_rx,
        }
    }

    /// Drains both channels until every sender is gone.
    ///
    /// Queued metrics are preferred over deletions, so a deletion event is never published
    /// ahead of a record that was already waiting in the metrics channel.
    pub async fn run(mut self) {
        let mut metrics_open = true;
        let mut deletions_open = true;
        while metrics_open || deletions_open {
            let record = tokio::select! {
                biased;
                record = self.metrics_rx.recv(), if metrics_open => match record {
                    Some(record) => record,
                    None => {
                        metrics_open = false;
                        continue;
                    }
                },
                deletion = self.deletion_rx.recv(), if deletions_open => match deletion {
                    Some(deletion) => OutboundRecord::Deletion(deletion),
                    None => {
                        deletions_open = false;
                        continue;
                    }
                },
            };
            if let Err(err) = self.forward(&record).await {
                log::error!(
                    target: "publisher",
                    "dropping record: container_id={}, error={}",
                    record.id(),
                    err
                );
            }
        }
        log::debug!(target: "publisher", "All producers gone, publisher stopped");
    }

    async fn forward(&mut self, record: &OutboundRecord) -> Result<(), Error> {
        let payload = serde_json::to_vec(record).map_err(Error::Serialization)?;
        self.bus
            .publish(&self.topic, &payload)
            .await
            .map_err(|err| Error::Publish(Box::new(err)))?;
        log::trace!(target: "publisher", "Published record for `{}`", record.id().short());
        Ok(())
    }
}
