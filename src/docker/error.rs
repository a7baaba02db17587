use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to docker socket `{path}`: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP handshake with the docker daemon failed: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("failed to build request for `{path}`: {source}")]
    Request {
        path: String,
        #[source]
        source: hyper::http::Error,
    },
    #[error("request `{path}` failed: {source}")]
    Send {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("request `{path}` returned status {status}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },
    #[error("failed to read response body: {0}")]
    Body(#[source] hyper::Error),
    #[error("invalid JSON response for `{path}`: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed stats frame: {0}")]
    Frame(#[source] serde_json::Error),
    #[error("stats frame exceeds {limit} bytes without a line break")]
    FrameTooLong { limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
