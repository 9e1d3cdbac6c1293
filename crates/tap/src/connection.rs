//! Per-client connection handler
//!
//! Registers a filter + wire sink pair with the bus, then reads command
//! lines until the client quits, the socket fails, the bus evicts the
//! subscriber or the server shuts down.
//!
//! ```text
//! CONNECTED ──► PAUSED ⇄ ACTIVE ──► CLOSED
//!             (start / stop)   (quit, EOF, I/O error, eviction, shutdown)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use perftap_metrics::TapMetrics;
use perftap_protocol::{Command, EncoderOptions, USAGE, info_line, pattern_ack};

use crate::bus::BroadcastBus;
use crate::error::{Result, TapError};
use crate::filter::{FilterHandle, SampleFilter};
use crate::sink::{LineWriter, WireSink};

/// Greeting for clients that connect while the bus is shutting down
pub const BUS_CLOSED_REPLY: &str = "Sorry... bye bye";

/// Reply to a filter command whose regex does not compile
pub const ILLEGAL_PATTERN_REPLY: &str = "Illegal pattern";

/// Reply to unrecognized input (followed by the usage line)
pub const UNKNOWN_COMMAND_REPLY: &str = "Huh?";

/// Longest command line accepted; longer lines are discarded unparsed
pub const MAX_COMMAND_LINE: usize = 4096;

/// Per-connection settings
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub write_timeout: Duration,
    pub encoder: EncoderOptions,
}

/// One client session
pub struct Connection {
    bus: Arc<BroadcastBus>,
    metrics: Arc<TapMetrics>,
    settings: ConnectionSettings,
    peer: SocketAddr,
}

impl Connection {
    pub fn new(bus: Arc<BroadcastBus>, settings: ConnectionSettings, peer: SocketAddr) -> Self {
        Self {
            metrics: bus.metrics(),
            bus,
            settings,
            peer,
        }
    }

    /// Serve the client until the session ends
    ///
    /// I/O errors end only this session; they are returned for logging.
    pub async fn handle<S>(self, stream: S, cancel: CancellationToken) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let writer = LineWriter::new(writer, self.settings.write_timeout);

        let filter = FilterHandle::new();
        let sink = WireSink::new(writer.clone(), self.settings.encoder);
        let listener_id = match self
            .bus
            .add(Box::new(SampleFilter::new(filter.clone(), sink)))
        {
            Ok(id) => id,
            Err(TapError::BusClosed) => {
                debug!(peer = %self.peer, "bus closed, turning client away");
                let _ = writer.write_str(&info_line(BUS_CLOSED_REPLY)).await;
                writer.shutdown().await;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        info!(peer = %self.peer, listener_id, "subscriber connected");

        let result = self
            .command_loop(BufReader::new(reader), &writer, &filter, cancel)
            .await;

        self.bus.remove(listener_id).await;
        writer.shutdown().await;

        debug!(peer = %self.peer, listener_id, "subscriber disconnected");
        result
    }

    async fn command_loop<R, W>(
        &self,
        mut reader: BufReader<R>,
        writer: &LineWriter<W>,
        filter: &FilterHandle,
        cancel: CancellationToken,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send,
    {
        let mut buf = Vec::with_capacity(256);

        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                // evicted by the bus or closed during shutdown
                _ = writer.closed() => return Ok(()),
                line = read_command_line(&mut reader, &mut buf) => line?,
            };
            if let CommandLine::Eof = line {
                // peer closed its side
                return Ok(());
            }
            self.metrics.commands_received.fetch_add(1, Ordering::Relaxed);

            let command = match line {
                CommandLine::Eof => return Ok(()),
                CommandLine::Overlong => {
                    debug!(peer = %self.peer, limit = MAX_COMMAND_LINE, "discarded overlong command line");
                    Command::Unknown(String::new())
                }
                CommandLine::Line(line) => Command::parse(line.trim_end_matches('\r')),
            };

            match command {
                Command::SetPattern { field, pattern } => match filter.set(field, &pattern) {
                    Ok(()) => {
                        writer
                            .write_str(&info_line(&pattern_ack(field, &pattern)))
                            .await?;
                    }
                    Err(e) => {
                        debug!(peer = %self.peer, error = %e, "rejected filter pattern");
                        self.metrics.invalid_patterns.fetch_add(1, Ordering::Relaxed);
                        writer.write_str(&info_line(ILLEGAL_PATTERN_REPLY)).await?;
                    }
                },
                Command::Start => filter.start(),
                Command::Stop => filter.stop(),
                Command::Quit => return Ok(()),
                Command::Unknown(_) => {
                    let reply = format!(
                        "{}{}",
                        info_line(UNKNOWN_COMMAND_REPLY),
                        info_line(USAGE)
                    );
                    writer.write_str(&reply).await?;
                }
            }
        }
    }
}

enum CommandLine {
    Line(String),
    Overlong,
    Eof,
}

/// Read one newline-terminated line of at most [`MAX_COMMAND_LINE`] bytes
///
/// Bytes that are not UTF-8 are replaced rather than failing the session.
async fn read_command_line<R>(
    reader: &mut BufReader<R>,
    buf: &mut Vec<u8>,
) -> std::io::Result<CommandLine>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    let read = (&mut *reader)
        .take(MAX_COMMAND_LINE as u64 + 1)
        .read_until(b'\n', buf)
        .await?;
    if read == 0 {
        return Ok(CommandLine::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > MAX_COMMAND_LINE {
        // skip the remainder up to and including the newline
        loop {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                break;
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    reader.consume(end + 1);
                    break;
                }
                None => {
                    let len = available.len();
                    reader.consume(len);
                }
            }
        }
        return Ok(CommandLine::Overlong);
    }

    Ok(CommandLine::Line(String::from_utf8_lossy(buf).into_owned()))
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
