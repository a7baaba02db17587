//! A scripted Docker daemon listening on a unix socket, for tests.

use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::sync::mpsc;

/// Serves one canned response per accepted connection and reports each request line.
///
/// A response is written part by part with a short pause in between, so every part
/// reaches the client as a separate read.
pub(crate) fn serve(socket: &Path, responses: Vec<Vec<Vec<u8>>>) -> mpsc::UnboundedReceiver<String> {
    let listener = UnixListener::bind(socket).unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        for parts in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut byte = [0u8; 1];
            while !head.ends_with(b"\r\n\r\n") {
                if stream.read(&mut byte).await.unwrap() == 0 {
                    break;
                }
                head.push(byte[0]);
            }
            let head = String::from_utf8(head).unwrap();
            let _ = tx.send(head.lines().next().unwrap_or_default().to_owned());
            for part in parts {
                stream.write_all(&part).await.unwrap();
                stream.flush().await.unwrap();
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        }
    });
    rx
}

pub(crate) fn json_response(status: &str, body: &str) -> Vec<Vec<u8>> {
    vec![
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
        .into_bytes(),
    ]
}

pub(crate) fn chunked_response(chunks: &[&str]) -> Vec<Vec<u8>> {
    let mut parts = vec![
        b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n"
            .to_vec(),
    ];
    for chunk in chunks {
        parts.push(format!("{:x}\r\n{chunk}\r\n", chunk.len()).into_bytes());
    }
    parts.push(b"0\r\n\r\n".to_vec());
    parts
}
