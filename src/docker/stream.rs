use http_body_util::BodyExt;
use hyper::body::Incoming;

use crate::container::ContainerID;
use crate::metrics::{MetricStream, RawFrame};

use super::models::StatsFrame;
use super::{Error, Result};

/// Upper bound for a single stats frame. Real frames are a few KiB.
pub(super) const MAX_FRAME_LEN: usize = 1 << 20;

/// Splits a byte stream into newline-terminated records.
///
/// Chunk boundaries of the HTTP body are unrelated to record boundaries: one chunk may hold
/// several records, and one record may span several chunks.
#[derive(Debug, Default)]
pub(super) struct LineBuffer {
    buf: Vec<u8>,
    /// Prefix of `buf` already known to contain no `\n`.
    scanned: usize,
}

impl LineBuffer {
    pub(super) fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pops the next complete, non-blank line (without the terminator).
    pub(super) fn next_line(&mut self) -> Option<Vec<u8>> {
        while let Some(pos) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=self.scanned + pos).collect();
            self.scanned = 0;
            line.pop();
            if !line.trim_ascii().is_empty() {
                return Some(line);
            }
        }
        self.scanned = self.buf.len();
        None
    }

    /// Bytes buffered towards a line that has not been terminated yet.
    pub(super) fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Takes whatever is left once the stream has ended, if it is not blank.
    pub(super) fn take_rest(&mut self) -> Option<Vec<u8>> {
        self.scanned = 0;
        let rest = std::mem::take(&mut self.buf);
        (!rest.trim_ascii().is_empty()).then_some(rest)
    }
}

/// A live `stats?stream=true` response. Dropping it closes the connection.
#[derive(Debug)]
pub struct StatsStream {
    id: ContainerID,
    body: Incoming,
    lines: LineBuffer,
    ended: bool,
}

impl StatsStream {
    pub(super) fn new(id: ContainerID, body: Incoming) -> Self {
        Self {
            id,
            body,
            lines: LineBuffer::default(),
            ended: false,
        }
    }

    pub fn container_id(&self) -> &ContainerID {
        &self.id
    }
}

fn decode(line: &[u8]) -> Result<RawFrame> {
    serde_json::from_slice::<StatsFrame>(line)
        .map(RawFrame::from)
        .map_err(Error::Frame)
}

impl MetricStream for StatsStream {
    type Error = Error;

    async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        loop {
            if let Some(line) = self.lines.next_line() {
                return decode(&line).map(Some);
            }
            if self.lines.pending() > MAX_FRAME_LEN {
                return Err(Error::FrameTooLong {
                    limit: MAX_FRAME_LEN,
                });
            }
            if self.ended {
                return self.lines.take_rest().map(|rest| decode(&rest)).transpose();
            }
            match self.body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        self.lines.extend(&data);
                    }
                }
                Some(Err(err)) => return Err(Error::Body(err)),
                None => {
                    log::trace!("Stats body for `{}` ended", self.id.short());
                    self.ended = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_handles_split_and_merged_chunks() {
        let mut lines = LineBuffer::default();
        lines.extend(b"{\"a\":");
        assert_eq!(lines.next_line(), None);

        lines.extend(b"1}\n{\"b\":2}\n\n{\"c\"");
        assert_eq!(lines.next_line().as_deref(), Some(&b"{\"a\":1}"[..]));
        assert_eq!(lines.next_line().as_deref(), Some(&b"{\"b\":2}"[..]));
        assert_eq!(lines.next_line(), None);

        lines.extend(b":3}");
        assert_eq!(lines.next_line(), None);
        assert_eq!(lines.take_rest().as_deref(), Some(&b"{\"c\":3}"[..]));
        assert_eq!(lines.take_rest(), None);
    }

    #[test]
    fn test_line_buffer_strips_crlf_and_blank_rest() {
        let mut lines = LineBuffer::default();
        lines.extend(b"{}\r\n \r\n  ");
        let line = lines.next_line().unwrap();
        assert_eq!(line.trim_ascii(), b"{}");
        assert_eq!(lines.next_line(), None);
        assert_eq!(lines.take_rest(), None);
    }

    #[test]
    fn test_line_buffer_only_scans_new_bytes() {
        let mut lines = LineBuffer::default();
        lines.extend(b"{\"a\":");
        assert_eq!(lines.next_line(), None);
        assert_eq!(lines.scanned, 5);

        lines.extend(b"1");
        assert_eq!(lines.next_line(), None);
        assert_eq!(lines.scanned, 6);
        assert_eq!(lines.pending(), 6);

        lines.extend(b"}\n{");
        assert_eq!(lines.next_line().as_deref(), Some(&b"{\"a\":1}"[..]));
        assert_eq!(lines.next_line(), None);
        assert_eq!(lines.pending(), 1);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"not json"), Err(Error::Frame(_))));
    }
}
