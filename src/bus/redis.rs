use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

use crate::metrics::MessageBus;

use super::{Error, Result};

type Connection = BufStream<TcpStream>;

/// Publishes to Redis pub/sub channels over a single lazily re-established connection.
///
/// A failed publish is not retried. If the failure left the connection in an unknown state,
/// the connection is dropped and the next publish dials again.
#[derive(Debug)]
pub struct RedisBus {
    addr: String,
    conn: Option<Connection>,
}

impl RedisBus {
    /// Connects to the Redis server at `addr` (`host:port`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the server cannot be reached.
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let conn = dial(&addr).await?;
        log::debug!("Connected to Redis at {}", addr);
        Ok(Self {
            addr,
            conn: Some(conn),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Sends `PUBLISH topic payload` and returns the number of subscribers that received it.
    pub async fn publish_to(&mut self, topic: &str, payload: &[u8]) -> Result<i64> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                log::debug!("Reconnecting to Redis at {}", self.addr);
                dial(&self.addr).await?
            }
        };
        let command = encode_command(&[b"PUBLISH".as_slice(), topic.as_bytes(), payload]);
        let result = exchange(&mut conn, &command).await;
        if matches!(result, Ok(_) | Err(Error::Server(_))) {
            self.conn = Some(conn);
        }
        result
    }
}

impl MessageBus for RedisBus {
    type Error = Error;

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let receivers = self.publish_to(topic, payload).await?;
        log::trace!(
            "Published {} bytes to `{}` ({} receivers)",
            payload.len(),
            topic,
            receivers
        );
        Ok(())
    }
}

async fn dial(addr: &str) -> Result<Connection> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| Error::Connect {
            addr: addr.to_owned(),
            source,
        })?;
    stream.set_nodelay(true)?;
    Ok(BufStream::new(stream))
}

async fn exchange(conn: &mut Connection, command: &[u8]) -> Result<i64> {
    conn.write_all(command).await?;
    conn.flush().await?;
    read_integer_reply(conn).await
}

/// Encodes `args` as a RESP array of bulk strings.
fn encode_command(args: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + args.iter().map(|arg| arg.len() + 16).sum::<usize>());
    out.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Reads a single RESP reply that is expected to be an integer.
async fn read_integer_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<i64> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    let line = line.trim_end_matches(['\r', '\n']);
    match line.split_at_checked(1) {
        Some((":", value)) => value
            .parse::<i64>()
            .map_err(|_| Error::Protocol(line.to_owned())),
        Some(("-", message)) => Err(Error::Server(message.to_owned())),
        _ => Err(Error::Protocol(line.to_owned())),
    }
}
