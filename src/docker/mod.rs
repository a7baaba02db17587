//! Minimal Docker Engine API client over the daemon's unix socket.
//!
//! Every request opens its own HTTP/1.1 connection, so a long-lived stats stream never
//! blocks other requests. Only the endpoints this crate needs are implemented:
//!
//! - `GET /_ping`
//! - `GET /containers/json`
//! - `GET /images/json?all=true`
//! - `GET /containers/{id}/stats?stream=true`
use std::path::PathBuf;

use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response};
use serde::de::DeserializeOwned;

use crate::container::ContainerID;
use crate::metrics::{InventoryProvider, StatsProvider};

mod error;
#[cfg(test)]
pub(crate) mod fake;
mod models;
mod stream;
mod transport;

pub use error::{Error, Result};
pub use models::{ContainerSummary, CpuStats, CpuUsage, ImageSummary, MemoryStats, Port, StatsFrame};
pub use stream::StatsStream;

use transport::UnixConnector;

/// Default location of the Docker daemon socket.
pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

#[derive(Debug, Clone)]
pub struct DockerClient {
    connector: UnixConnector,
}

impl DockerClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            connector: UnixConnector::new(socket_path),
        }
    }

    /// Checks that the daemon is reachable and answering.
    pub async fn ping(&self) -> Result<()> {
        self.get("/_ping").await.map(|_| ())
    }

    /// Lists containers; stopped ones are included only if `all` is set.
    pub async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        self.get_json(&format!("/containers/json?all={all}")).await
    }

    /// Lists images, intermediate layers included.
    pub async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        self.get_json("/images/json?all=true").await
    }

    /// Opens a continuous stats stream for `id`.
    pub async fn stats(&self, id: &ContainerID) -> Result<StatsStream> {
        let response = self
            .get(&format!("/containers/{id}/stats?stream=true"))
            .await?;
        Ok(StatsStream::new(id.clone(), response.into_body()))
    }

    async fn get(&self, path: &str) -> Result<Response<Incoming>> {
        let mut sender = transport::connect(&self.connector).await?;
        let request = Request::get(path)
            .header(hyper::header::HOST, "docker")
            .body(Empty::<Bytes>::new())
            .map_err(|source| Error::Request {
                path: path.to_owned(),
                source,
            })?;
        log::trace!("GET {}", path);
        let response = sender
            .send_request(request)
            .await
            .map_err(|source| Error::Send {
                path: path.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(Error::Body)?
                .to_bytes();
            return Err(Error::Status {
                path: path.to_owned(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self
            .get(path)
            .await?
            .into_body()
            .collect()
            .await
            .map_err(Error::Body)?
            .to_bytes();
        serde_json::from_slice(&body).map_err(|source| Error::Json {
            path: path.to_owned(),
            source,
        })
    }
}

/// Extracts `message` from the daemon's JSON error body, falling back to the raw text.
fn error_message(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) => err.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
    }
}

impl InventoryProvider for DockerClient {
    type Error = Error;

    /// Lists the ids of all running containers.
    async fn list(&self) -> Result<Vec<ContainerID>> {
        let containers = self.list_containers(false).await?;
        Ok(containers
            .into_iter()
            .filter_map(|container| match ContainerID::new(&container.id) {
                Ok(id) => Some(id),
                Err(err) => {
                    log::warn!("skipping container with unusable id: {}", err);
                    None
                }
            })
            .collect())
    }
}

impl StatsProvider for DockerClient {
    type Error = Error;
    type Stream = StatsStream;

    async fn open(&self, id: &ContainerID) -> Result<StatsStream> {
        self.stats(id).await
    }
}
