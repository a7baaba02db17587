use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::container::ContainerID;

use super::error::Error;
use super::normalize::normalize;
use super::provider::{MetricStream, StatsProvider};
use super::record::OutboundRecord;

/// How a collector task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorExit {
    /// The cancellation token was observed, or nobody is left to receive records.
    Cancelled,
    /// The runtime closed the stats stream.
    Completed,
    /// The stream could not be opened or a frame could not be decoded.
    Failed,
}

/// Streams, normalizes and forwards stats for a single container until cancelled.
///
/// Cancellation is only checked between frames: a read that is already in flight runs to
/// completion, and the record it produces may still be sent.
///
/// Sending blocks while the outbound channel is full, which throttles ingestion to the pace
/// of the publisher.
pub async fn run<S: StatsProvider>(
    id: ContainerID,
    provider: Arc<S>,
    cancel: CancellationToken,
    tx: mpsc::Sender<OutboundRecord>,
) -> CollectorExit {
    let mut stream = match provider.open(&id).await {
        Ok(stream) => stream,
        Err(err) => {
            let err = Error::StreamOpen {
                id: id.clone(),
                source: Box::new(err),
            };
            log::error!(target: "collector", "{}", err);
            return CollectorExit::Failed;
        }
    };
    log::debug!(target: "collector", "Collecting stats for container `{}`", id.short());

    loop {
        if cancel.is_cancelled() {
            log::debug!(target: "collector", "Collector for `{}` cancelled", id.short());
            return CollectorExit::Cancelled;
        }

        let frame = match stream.next_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::debug!(target: "collector", "Stats stream for `{}` ended", id.short());
                return CollectorExit::Completed;
            }
            Err(err) => {
                let err = Error::Decode {
                    id,
                    source: Box::new(err),
                };
                log::error!(target: "collector", "{}", err);
                return CollectorExit::Failed;
            }
        };

        let metrics = normalize(&id, &frame);
        log::trace!(
            target: "collector",
            "{}: cpu={:.2}% mem={:.2}%",
            id.short(),
            metrics.cpu_percent,
            metrics.memory_percent
        );
        if tx.send(metrics.into()).await.is_err() {
            log::debug!(target: "collector", "Outbound channel closed, stopping `{}`", id.short());
            return CollectorExit::Cancelled;
        }
    }
}
