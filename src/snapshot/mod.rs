//! Periodic whole-inventory snapshots published next to the metrics stream.
//!
//! Each [`Feed`] lists something from the daemon once per interval and publishes the full
//! listing as a JSON array on its own topic. Nothing is carried over between cycles.
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::docker::DockerClient;
use crate::error::ResultOkLogExt;
use crate::metrics::MessageBus;

mod error;
mod models;

pub use error::{Error, Result};
pub use models::{ContainerInfo, ImageInfo, containers_per_image};

pub const CONTAINERS_TOPIC: &str = "containers_list";
pub const IMAGES_TOPIC: &str = "images_list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// All containers, running or not.
    Containers,
    /// All images with the number of containers created from each.
    Images,
}

impl Feed {
    pub fn topic(self) -> &'static str {
        match self {
            Feed::Containers => CONTAINERS_TOPIC,
            Feed::Images => IMAGES_TOPIC,
        }
    }

    /// Builds one serialized snapshot.
    pub async fn payload(self, docker: &DockerClient) -> Result<Vec<u8>> {
        match self {
            Feed::Containers => {
                let containers: Vec<ContainerInfo> = docker
                    .list_containers(true)
                    .await?
                    .into_iter()
                    .map(ContainerInfo::from)
                    .collect();
                serde_json::to_vec(&containers).map_err(Error::Serialization)
            }
            Feed::Images => {
                let images = docker.list_images().await?;
                let counts = docker
                    .list_containers(true)
                    .await
                    .map(|containers| containers_per_image(&containers))
                    .ok_log_with("counting containers per image")
                    .unwrap_or_default();
                let images: Vec<ImageInfo> = images
                    .into_iter()
                    .map(|image| ImageInfo::new(image, &counts))
                    .collect();
                serde_json::to_vec(&images).map_err(Error::Serialization)
            }
        }
    }

    /// Publishes one snapshot per `interval` until `shutdown` fires.
    pub async fn run<B: MessageBus>(
        self,
        docker: DockerClient,
        mut bus: B,
        interval: Duration,
        shutdown: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::debug!("Publishing `{}` snapshots", self.topic());
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }
            let Some(payload) = self.payload(&docker).await.ok_log_with(self.topic()) else {
                continue;
            };
            bus.publish(self.topic(), &payload)
                .await
                .map_err(|err| Error::Publish(Box::new(err)))
                .ok_log_with(self.topic());
        }
        log::debug!("Stopped `{}` snapshots", self.topic());
    }
}
