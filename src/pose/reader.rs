//! JSON Lines pose frame reader.
//!
//! Each non-blank line holds one frame:
//! `{"keypoints":[{"name":"nose","x":0.51,"y":0.22,"z":-0.03,"score":0.98}, ...]}`

use crate::error::{Result, SignError};
use crate::pose::frame::PoseFrame;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads pose frames from a line-delimited JSON stream.
pub struct FrameReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    /// Wraps a buffered async reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
        }
    }

    /// Returns the next frame, or `None` at end of stream.
    ///
    /// Blank lines are skipped. A line that is not a valid frame, including
    /// one that is not UTF-8, is an `InvalidFrame` error naming the line; the
    /// reader stays usable. Read failures are returned as `Io`.
    pub async fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = std::str::from_utf8(&self.buf).map_err(|e| SignError::InvalidFrame {
                message: format!("line {}: invalid UTF-8: {}", self.line_number, e),
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return serde_json::from_str(line)
                .map(Some)
                .map_err(|e| SignError::InvalidFrame {
                    message: format!("line {}: {}", self.line_number, e),
                });
        }
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
