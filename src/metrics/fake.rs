//! In-memory stand-ins for the Docker daemon and the bus, used by the lifecycle tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::container::ContainerID;

use super::normalize::RawFrame;
use super::provider::{InventoryProvider, MessageBus, MetricStream, StatsProvider};

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub &'static str);

pub fn id(raw: &str) -> ContainerID {
    ContainerID::new(raw).unwrap()
}

pub fn frame(name: &str, memory_usage: u64) -> RawFrame {
    RawFrame {
        name: format!("/{name}"),
        cpu_total_usage: 10,
        system_cpu_usage: 100,
        precpu_total_usage: 5,
        precpu_system_usage: 50,
        memory_usage,
        memory_limit: 1000,
    }
}

/// Replays scripted inventory responses, one per `list()` call.
#[derive(Debug, Clone, Default)]
pub struct FakeInventory {
    responses: Arc<Mutex<VecDeque<Result<Vec<ContainerID>, FakeError>>>>,
}

impl FakeInventory {
    pub fn push_ok(&self, ids: &[&str]) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ids.iter().map(|raw| id(raw)).collect()));
    }

    pub fn push_err(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(FakeError("inventory unavailable")));
    }
}

impl InventoryProvider for FakeInventory {
    type Error = FakeError;

    async fn list(&self) -> Result<Vec<ContainerID>, FakeError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FakeError("no scripted inventory response")))
    }
}

#[derive(Debug, Default)]
struct FakeStatsState {
    senders: HashMap<ContainerID, mpsc::UnboundedSender<Result<RawFrame, FakeError>>>,
    opens: HashMap<ContainerID, usize>,
    failing_opens: HashSet<ContainerID>,
}

/// Hands out streams whose frames are pushed by the test.
#[derive(Debug, Clone, Default)]
pub struct FakeStats {
    state: Arc<Mutex<FakeStatsState>>,
}

impl FakeStats {
    /// Feeds one frame into the currently open stream of `id`.
    ///
    /// Returns `false` if no stream is open for `id`.
    pub fn push(&self, id: &ContainerID, frame: RawFrame) -> bool {
        self.send(id, Ok(frame))
    }

    /// Makes the next read on the stream of `id` fail with a decode error.
    pub fn fail(&self, id: &ContainerID) -> bool {
        self.send(id, Err(FakeError("malformed frame")))
    }

    /// Ends the stream of `id`.
    pub fn close(&self, id: &ContainerID) {
        self.state.lock().unwrap().senders.remove(id);
    }

    pub fn fail_open(&self, id: &ContainerID) {
        self.state.lock().unwrap().failing_opens.insert(id.clone());
    }

    pub fn allow_open(&self, id: &ContainerID) {
        self.state.lock().unwrap().failing_opens.remove(id);
    }

    pub fn opens(&self, id: &ContainerID) -> usize {
        self.state
            .lock()
            .unwrap()
            .opens
            .get(id)
            .copied()
            .unwrap_or_default()
    }

    /// Waits until `id` has been opened at least `count` times.
    pub async fn wait_for_opens(&self, id: &ContainerID, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.opens(id) < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("stream was not opened in time");
    }

    fn send(&self, id: &ContainerID, item: Result<RawFrame, FakeError>) -> bool {
        self.state
            .lock()
            .unwrap()
            .senders
            .get(id)
            .is_some_and(|tx| tx.send(item).is_ok())
    }
}

impl StatsProvider for FakeStats {
    type Error = FakeError;
    type Stream = FakeStream;

    async fn open(&self, id: &ContainerID) -> Result<FakeStream, FakeError> {
        let mut state = self.state.lock().unwrap();
        *state.opens.entry(id.clone()).or_default() += 1;
        if state.failing_opens.contains(id) {
            return Err(FakeError("no such container"));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.senders.insert(id.clone(), tx);
        Ok(FakeStream { rx })
    }
}

#[derive(Debug)]
pub struct FakeStream {
    rx: mpsc::UnboundedReceiver<Result<RawFrame, FakeError>>,
}

impl MetricStream for FakeStream {
    type Error = FakeError;

    async fn next_frame(&mut self) -> Result<Option<RawFrame>, FakeError> {
        self.rx.recv().await.transpose()
    }
}

/// Records every publish; can be told to reject the next few.
#[derive(Debug, Clone, Default)]
pub struct FakeBus {
    published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    failures: Arc<Mutex<usize>>,
}

impl FakeBus {
    pub fn fail_next(&self, count: usize) {
        *self.failures.lock().unwrap() = count;
    }

    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(topic, payload)| (topic.clone(), serde_json::from_slice(payload).unwrap()))
            .collect()
    }

    pub async fn wait_for(&self, count: usize) -> Vec<(String, serde_json::Value)> {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.published.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("records were not published in time");
        self.published()
    }
}

impl MessageBus for FakeBus {
    type Error = FakeError;

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), FakeError> {
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(FakeError("bus unavailable"));
            }
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }
}
