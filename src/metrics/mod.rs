//! Per-container metrics collection and its task lifecycle.
//!
//! This module keeps one streaming collector alive per running container, normalizes raw
//! stats frames into a compact schema and forwards them to a message bus.
//!
//! # Key Components
//!
//! - [`Tracker`]: Polls the container inventory and spawns or cancels collectors so that
//!   exactly one exists per listed container. Emits a [`DeletionEvent`] when a container is
//!   gone.
//! - [`collector::run`]: Streams frames for one container until cancelled, and sends
//!   [`NormalizedMetrics`] into the shared outbound channel.
//! - [`Publisher`]: Sole consumer of that channel; serializes every record as JSON and
//!   publishes it under one topic.
//! - [`normalize`]: Pure conversion from a [`RawFrame`] into [`NormalizedMetrics`].
//!
//! # Delivery
//!
//! Records of one container are published in stream order. There is no ordering across
//! containers and no delivery guarantee: failed publishes are logged and dropped. A metrics
//! record may still arrive after the deletion event of the same container when it was read
//! just before the collector observed its cancellation.
pub mod collector;
mod error;
mod normalize;
mod provider;
mod publisher;
mod record;
mod tracker;

#[cfg(test)]
pub(crate) mod fake;

pub use collector::CollectorExit;
pub use error::{Error, Result};
pub use normalize::{RawFrame, normalize};
pub use provider::{InventoryProvider, MessageBus, MetricStream, StatsProvider};
pub use publisher::{DEFAULT_METRICS_TOPIC, Publisher};
pub use record::{DELETION_REASON, DeletionEvent, NormalizedMetrics, OutboundRecord, ResourceHandle};
pub use tracker::{CycleReport, Tracker};
