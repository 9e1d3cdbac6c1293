//! Socket-facing end of a subscriber pipeline
//!
//! `LineWriter` owns the write half of a client socket and is shared by the
//! bus (sample lines) and the command loop (`I` replies). Every write is
//! bounded by the configured timeout; a timed-out or failed write surfaces
//! as an error, which makes the bus evict the subscriber.
//!
//! `WireSink` is the [`SampleListener`] at the end of the chain: it encodes
//! each event with the connection's [`WireEncoder`] and writes the lines.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use perftap_protocol::{CategoryEvent, EncoderOptions, WireEncoder};

use crate::error::{Result, TapError};
use crate::listener::SampleListener;

/// Shared, timeout-bounded writer for one client socket
pub struct LineWriter<W> {
    inner: Arc<Mutex<Option<W>>>,
    timeout: Duration,
    closed: CancellationToken,
}

impl<W> Clone for LineWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            timeout: self.timeout,
            closed: self.closed.clone(),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> LineWriter<W> {
    pub fn new(writer: W, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(writer))),
            timeout,
            closed: CancellationToken::new(),
        }
    }

    /// Write and flush `text`
    pub async fn write_str(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let mut guard = self.inner.lock().await;
        let writer = guard.as_mut().ok_or(TapError::WriterClosed)?;

        let write = async {
            writer.write_all(text.as_bytes()).await?;
            writer.flush().await
        };
        match tokio::time::timeout(self.timeout, write).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TapError::WriteTimeout {
                timeout: self.timeout,
            }),
        }
    }

    /// Shut the socket down; later writes fail with `WriterClosed`
    ///
    /// Idempotent. Waiters on [`closed`](Self::closed) are released.
    pub async fn shutdown(&self) {
        let taken = self.inner.lock().await.take();
        if let Some(mut writer) = taken {
            let _ = tokio::time::timeout(self.timeout, writer.shutdown()).await;
        }
        self.closed.cancel();
    }

    /// Resolves once the writer has been shut down
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

/// Encoder + writer listener for one subscriber
pub struct WireSink<W> {
    encoder: WireEncoder,
    writer: LineWriter<W>,
    buf: String,
}

impl<W: AsyncWrite + Unpin + Send> WireSink<W> {
    pub fn new(writer: LineWriter<W>, options: EncoderOptions) -> Self {
        Self {
            encoder: WireEncoder::new(options),
            writer,
            buf: String::with_capacity(256),
        }
    }

    async fn flush_buf(&mut self) -> Result<()> {
        let result = self.writer.write_str(&self.buf).await;
        self.buf.clear();
        result
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> SampleListener for WireSink<W> {
    async fn category(&mut self, event: &CategoryEvent) -> Result<()> {
        self.encoder.encode_category(event, &mut self.buf);
        self.flush_buf().await
    }

    async fn data(&mut self, counter: &str, value: f64) -> Result<()> {
        self.encoder.encode_data(counter, value, &mut self.buf)?;
        self.flush_buf().await
    }

    async fn instance_data(&mut self, counter: &str, instance: &str, value: f64) -> Result<()> {
        self.encoder
            .encode_instance_data(counter, instance, value, &mut self.buf)?;
        self.flush_buf().await
    }

    async fn close(&mut self) {
        self.writer.shutdown().await;
    }
}

#[cfg(test)]
#[path = "sink_test.rs"]
mod tests;
