//! Dockwatch: streams per-container resource metrics from the Docker daemon to Redis.
//!
//! The library keeps one stats collector alive per running container, normalizes every frame
//! into a small JSON record and publishes it on a pub/sub topic. Containers that go away are
//! announced with a deletion event. Periodic snapshots of all containers and images are
//! published on separate topics.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bus::RedisBus;
use crate::config::Config;
use crate::docker::DockerClient;
use crate::metrics::{DeletionEvent, OutboundRecord, Publisher, Tracker};
use crate::snapshot::Feed;

pub mod bus;
pub mod config;
pub mod container;
pub mod docker;
pub mod error;
pub mod metrics;
pub mod snapshot;

const PUBLISHER_DRAIN: Duration = Duration::from_secs(5);

/// Runs Dockwatch until the process receives ctrl-c.
///
/// # Errors
///
/// Startup errors are returned; nothing after startup is fatal. Possible errors include:
/// - An invalid environment variable (see [`Config`]).
/// - The Docker daemon socket is unreachable.
/// - The Redis server is unreachable.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    log::debug!("Config: {:?}", config);

    let docker = DockerClient::new(&config.docker_socket);
    docker.ping().await?;
    log::debug!("Connected to Docker at {}", config.docker_socket.display());

    let metrics_bus = RedisBus::connect(&config.redis_addr).await?;
    let containers_bus = RedisBus::connect(&config.redis_addr).await?;
    let images_bus = RedisBus::connect(&config.redis_addr).await?;

    let (metrics_tx, metrics_rx) = mpsc::channel::<OutboundRecord>(config.channel_capacity);
    let (deletion_tx, deletion_rx) = mpsc::unbounded_channel::<DeletionEvent>();

    let publisher = tokio::spawn(
        Publisher::new(metrics_bus, &config.metrics_topic, metrics_rx, deletion_rx).run(),
    );

    let shutdown = CancellationToken::new();
    let snapshots = [
        (Feed::Containers, containers_bus),
        (Feed::Images, images_bus),
    ]
    .map(|(feed, bus)| {
        tokio::spawn(feed.run(
            docker.clone(),
            bus,
            config.snapshot_interval,
            shutdown.clone(),
        ))
    });

    let tracker = Tracker::new(
        docker.clone(),
        Arc::new(docker),
        metrics_tx,
        deletion_tx,
        config.tracker_interval,
    );
    let tracker = tokio::spawn(tracker.run(shutdown.clone()));
    log::info!("Dockwatch started, publishing to `{}`", config.metrics_topic);

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    shutdown.cancel();

    tracker.await?;
    for snapshot in snapshots {
        snapshot.await?;
    }
    // Collectors retired before shutdown may still hold a sender until their stream ends.
    match tokio::time::timeout(PUBLISHER_DRAIN, publisher).await {
        Ok(joined) => joined?,
        Err(_) => log::warn!("publisher did not drain in time, pending records are dropped"),
    }
    Ok(())
}
