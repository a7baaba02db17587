use std::path::{Path, PathBuf};
use std::{pin, task};

use http_body_util::Empty;
use hyper::body::Bytes;
use hyper::client::conn::http1::SendRequest;
use hyper_util::rt::TokioIo;
use tower::ServiceExt;

use super::Error;

/// Connects to a unix domain socket, ignoring the request URI.
#[derive(Debug, Clone)]
pub(super) struct UnixConnector {
    path: PathBuf,
}

impl UnixConnector {
    pub(super) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

impl tower::Service<hyper::Uri> for UnixConnector {
    type Response = TokioIo<tokio::net::UnixStream>;

    type Error = std::io::Error;

    type Future = pin::Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: hyper::Uri) -> Self::Future {
        let path = self.path.clone();
        Box::pin(async move {
            let stream = tokio::net::UnixStream::connect(path).await?;

            Ok(TokioIo::new(stream))
        })
    }
}

/// Opens a fresh HTTP/1.1 connection over the daemon socket.
///
/// The connection is driven by a background task that ends once the returned sender and
/// every response body obtained through it are dropped.
pub(super) async fn connect(
    connector: &UnixConnector,
) -> super::Result<SendRequest<Empty<Bytes>>> {
    let io = connector
        .clone()
        .oneshot(hyper::Uri::from_static("http://docker"))
        .await
        .map_err(|source| Error::Connect {
            path: connector.path().to_path_buf(),
            source,
        })?;
    let (sender, connection) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(Error::Handshake)?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            log::debug!("Docker connection closed with error: {}", err);
        }
    });

    Ok(sender)
}
