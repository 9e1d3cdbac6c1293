//! Tail client - line-oriented connection to a perftap server

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use perftap_protocol::FilterField;

/// Client for one subscriber session
pub struct TailClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TailClient {
    /// Connect to the server at `address` (`host:port`)
    pub async fn connect(address: &str) -> Result<Self> {
        let stream = TcpStream::connect(address)
            .await
            .with_context(|| format!("failed to connect to {}", address))?;
        let (reader, writer) = stream.into_split();

        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Send one raw command line
    pub async fn send(&mut self, command: &str) -> Result<()> {
        self.writer
            .write_all(format!("{}\n", command).as_bytes())
            .await
            .context("failed to send command")
    }

    /// Replace one server-side filter pattern
    pub async fn set_pattern(&mut self, field: FilterField, pattern: &str) -> Result<()> {
        self.send(&format!("{} {}", field.keyword(), pattern)).await
    }

    /// Receive the next line from the server
    ///
    /// Returns `Ok(None)` if the connection is closed.
    pub async fn recv(&mut self) -> Result<Option<String>> {
        self.lines
            .next_line()
            .await
            .context("failed to read from socket")
    }
}
