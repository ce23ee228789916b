//! Newline-delimited JSON reader and writer.
//!
//! [`CommandReader`] turns a byte stream into a sequence of parsed
//! [`Command`] values, one per line. A line that fails to parse is reported
//! as a recoverable [`Error::Parse`] and reading resumes on the next line;
//! end of input ends the sequence without error.
//!
//! [`ResponseWriter`] serializes one [`Response`] per output line and
//! flushes immediately, so the host observes results in strict command
//! order with no buffering delay.

// ============================================================================
// Imports
// ============================================================================

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{Error, Result};

use super::{Command, Response};

// ============================================================================
// CommandReader
// ============================================================================

/// Reads newline-delimited JSON commands from an input stream.
///
/// The reader is lazy and sequential: each call to [`next_command`] consumes
/// exactly one line. Parse failures are per-line and recoverable.
///
/// [`next_command`]: CommandReader::next_command
pub struct CommandReader<R> {
    reader: R,
    line: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> CommandReader<R> {
    /// Wraps a buffered input stream.
    #[inline]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
        }
    }

    /// Reads and parses the next command line.
    ///
    /// Returns `None` at end of input. A malformed line (bad JSON, bad
    /// UTF-8) yields `Some(Err(Error::Parse { .. }))`; the reader stays
    /// usable and the next call moves on to the following line.
    ///
    /// # Errors
    ///
    /// `Some(Err(Error::Io(_)))` if reading from the stream itself fails.
    /// That is the only unrecoverable case.
    pub async fn next_command(&mut self) -> Option<Result<Command>> {
        self.line.clear();

        // Lines are read as raw bytes so a non-UTF-8 line stays a per-line
        // parse failure instead of poisoning the stream.
        match self.reader.read_until(b'\n', &mut self.line).await {
            Ok(0) => None,
            Ok(_) => {
                while matches!(self.line.last(), Some(b'\n' | b'\r')) {
                    self.line.pop();
                }
                trace!(len = self.line.len(), "command line read");

                Some(
                    serde_json::from_slice::<Command>(&self.line)
                        .map_err(|e| Error::parse(e.to_string())),
                )
            }
            Err(e) => Some(Err(Error::Io(e))),
        }
    }
}

// ============================================================================
// ResponseWriter
// ============================================================================

/// Writes one JSON response per output line.
///
/// Each write is flushed before returning so a pipelining host sees every
/// response as soon as it is produced.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    /// Wraps an output stream.
    #[inline]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serializes and writes a single response line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying write or flush fails. The
    /// dispatch loop treats that as fatal.
    pub async fn write(&mut self, response: &Response) -> Result<()> {
        let mut line = serde_json::to_string(response)?;
        line.push('\n');

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
