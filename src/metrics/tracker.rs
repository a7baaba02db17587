use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::container::ContainerID;

use super::collector;
use super::error::Error;
use super::provider::{InventoryProvider, StatsProvider};
use super::record::{DeletionEvent, OutboundRecord, ResourceHandle};

/// How long [`Tracker::shutdown`] waits for collectors before aborting them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Changes applied by a single [`Tracker::reconcile`] cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Containers seen for the first time.
    pub spawned: Vec<ContainerID>,
    /// Containers that disappeared; a deletion event was emitted for each.
    pub removed: Vec<ContainerID>,
    /// Containers still listed whose collector had already exited.
    pub restarted: Vec<ContainerID>,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.removed.is_empty() && self.restarted.is_empty()
    }
}

/// Keeps exactly one collector task alive per container listed by the inventory.
///
/// The tracker is the only owner of the handle table; collectors never see it.
pub struct Tracker<I, S> {
    inventory: I,
    stats: Arc<S>,
    handles: HashMap<ContainerID, ResourceHandle>,
    metrics_tx: mpsc::Sender<OutboundRecord>,
    deletion_tx: mpsc::UnboundedSender<DeletionEvent>,
    interval: Duration,
}

impl<I, S> Tracker<I, S>
where
    I: InventoryProvider,
    S: StatsProvider,
{
    /// Creates a tracker that polls `inventory` every `interval`.
    ///
    /// # Arguments
    ///
    /// * `metrics_tx` - The shared channel every collector sends its records into.
    /// * `deletion_tx` - Deletion events go straight to the publisher through this channel.
    pub fn new(
        inventory: I,
        stats: Arc<S>,
        metrics_tx: mpsc::Sender<OutboundRecord>,
        deletion_tx: mpsc::UnboundedSender<DeletionEvent>,
        interval: Duration,
    ) -> Self {
        Self {
            inventory,
            stats,
            handles: HashMap::default(),
            metrics_tx,
            deletion_tx,
            interval,
        }
    }

    /// Number of containers currently tracked.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_tracking(&self, id: &ContainerID) -> bool {
        self.handles.contains_key(id)
    }

    /// Runs one reconciliation cycle against the current inventory.
    ///
    /// If the inventory cannot be listed, the cycle is skipped and nothing changes.
    pub async fn reconcile(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        let live: HashSet<ContainerID> = match self.inventory.list().await {
            Ok(ids) => ids.into_iter().collect(),
            Err(err) => {
                let err = Error::InventoryList(Box::new(err));
                log::warn!("{}; skipping cycle", err);
                return report;
            }
        };

        let gone: Vec<ContainerID> = self
            .handles
            .keys()
            .filter(|id| !live.contains(*id))
            .cloned()
            .collect();
        for id in gone {
            self.retire(&id);
            report.removed.push(id);
        }

        for id in live {
            match self.handles.get(&id) {
                Some(handle) if !handle.is_finished() => continue,
                Some(_) => {
                    log::warn!(
                        "collector for container `{}` exited while the container is still listed, restarting",
                        id.short()
                    );
                    report.restarted.push(id.clone());
                }
                None => report.spawned.push(id.clone()),
            }
            self.spawn_collector(id);
        }

        report.spawned.sort();
        report.removed.sort();
        report.restarted.sort();
        report
    }

    /// Reconciles once per interval until `shutdown` fires, then stops every collector.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let report = self.reconcile().await;
                    if !report.is_empty() {
                        log::debug!(
                            "Reconciled containers: spawned={}, removed={}, restarted={}, tracked={}",
                            report.spawned.len(),
                            report.removed.len(),
                            report.restarted.len(),
                            self.len()
                        );
                    }
                }
            }
        }
        self.shutdown().await;
    }

    /// Cancels every collector and waits for them to finish.
    ///
    /// Collectors still blocked in a read after [`SHUTDOWN_GRACE`] are aborted.
    pub async fn shutdown(&mut self) {
        log::debug!("Stopping {} collectors", self.handles.len());
        let tasks: Vec<_> = self
            .handles
            .drain()
            .map(|(id, handle)| (id, handle.cancel()))
            .collect();
        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
        for (id, mut task) in tasks {
            match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(Ok(exit)) => log::trace!("Collector for `{}` exited: {:?}", id.short(), exit),
                Ok(Err(err)) => log::error!("collector for `{}` panicked: {}", id.short(), err),
                Err(_) => {
                    log::warn!("collector for `{}` did not stop in time, aborting", id.short());
                    task.abort();
                }
            }
        }
    }

    fn spawn_collector(&mut self, id: ContainerID) {
        log::debug!("Tracking container `{}`", id.short());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(collector::run(
            id.clone(),
            Arc::clone(&self.stats),
            cancel.clone(),
            self.metrics_tx.clone(),
        ));
        self.handles
            .insert(id.clone(), ResourceHandle::new(id, cancel, task));
    }

    fn retire(&mut self, id: &ContainerID) {
        let Some(handle) = self.handles.remove(id) else {
            return;
        };
        log::debug!("Container `{}` is gone, stopping its collector", handle.id().short());
        // The task is detached; it exits at its next loop boundary.
        drop(handle.cancel());
        if self.deletion_tx.send(DeletionEvent::new(id.clone())).is_err() {
            log::error!(
                "publisher is gone, dropping deletion event for container `{}`",
                id.short()
            );
        }
    }
}
