//! Stream Collector - child stdout/stderr capture
//!
//! One reader task per stream reads raw bytes, decodes them and forwards each
//! chunk as an [`OutputChunk`] to the record's driver, which appends it to the
//! matching buffer. Chunks are not split into lines and no size limit applies.

use crate::process::{ProcessHandle, ProcessRecord};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Read buffer size per stream
const READ_CHUNK_SIZE: usize = 8192;

/// Which output stream a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// A decoded piece of output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub text: String,
}

/// Incremental UTF-8 decoder.
///
/// A multi-byte sequence cut by a chunk boundary is held back until the rest
/// arrives; invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, returning all text that is complete so far.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;
        loop {
            let rest = &self.pending[start..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid_len = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid_len]));
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start += valid_len + bad;
                        }
                        // incomplete sequence at the end, wait for more bytes
                        None => {
                            start += valid_len;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Flush whatever is still held back (stream closed mid-sequence).
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(text)
    }
}

/// Reader task body: forward `reader` to the driver until EOF.
pub(crate) async fn forward_stream<R>(
    mut reader: R,
    stream: OutputStream,
    tx: UnboundedSender<OutputChunk>,
    handle: ProcessHandle,
) where
    R: AsyncRead + Unpin,
{
    let mut decoder = Utf8ChunkDecoder::new();
    let mut buf = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("Process {} {} read error: {}", handle, stream.as_str(), e);
                break;
            }
        };

        let text = decoder.decode(&buf[..n]);
        if text.is_empty() {
            continue;
        }
        if tx.send(OutputChunk { stream, text }).is_err() {
            // driver is gone, nobody will read this anymore
            return;
        }
    }

    if let Some(text) = decoder.finish() {
        let _ = tx.send(OutputChunk { stream, text });
    }
    debug!("Process {} {} closed", handle, stream.as_str());
}

/// Apply a chunk to its record.
pub(crate) fn collect(record: &ProcessRecord, chunk: OutputChunk) {
    record.append(chunk.stream, chunk.text);
}
