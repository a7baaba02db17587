#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to redis at `{addr}`: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("redis connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("redis replied with an error: {0}")]
    Server(String),
    #[error("unexpected redis reply: {0:?}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, Error>;
