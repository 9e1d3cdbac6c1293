//! TCP server for subscriber connections
//!
//! Accepts clients on one port and runs a [`Connection`] task for each.
//! There is no connection limit. On cancellation the server stops
//! accepting and waits for the open sessions to wind down.

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{SockRef, TcpKeepalive};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use perftap_config::ServerConfig;
use perftap_metrics::TapMetrics;
use perftap_protocol::EncoderOptions;

use crate::bus::BroadcastBus;
use crate::connection::{Connection, ConnectionSettings};
use crate::error::{Result, TapError};

const KEEPALIVE_TIME: std::time::Duration = std::time::Duration::from_secs(60);

/// Subscriber-facing TCP server
pub struct TapServer {
    listener: TcpListener,
    bus: Arc<BroadcastBus>,
    config: ServerConfig,
    metrics: Arc<TapMetrics>,
}

impl TapServer {
    /// Bind the listening socket
    pub async fn bind(config: ServerConfig, bus: Arc<BroadcastBus>) -> Result<Self> {
        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| TapError::Bind { address, source })?;

        Ok(Self {
            listener,
            metrics: bus.metrics(),
            bus,
            config,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Metrics handle for the reporter
    pub fn metrics(&self) -> Arc<TapMetrics> {
        Arc::clone(&self.metrics)
    }

    fn settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            write_timeout: self.config.write_timeout,
            encoder: EncoderOptions {
                timestamp_offset: self.config.timestamp_offset,
            },
        }
    }

    fn configure_socket(&self, stream: &TcpStream) {
        let socket = SockRef::from(stream);

        if self.config.nodelay
            && let Err(e) = socket.set_tcp_nodelay(true)
        {
            warn!(error = %e, "failed to set TCP_NODELAY");
        }

        let keepalive = TcpKeepalive::new().with_time(KEEPALIVE_TIME);
        if let Err(e) = socket.set_tcp_keepalive(&keepalive) {
            warn!(error = %e, "failed to set TCP keepalive");
        }
    }

    /// Accept clients until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let local = self.local_addr()?;
        info!(address = %local, "subscriber server listening");

        let settings = self.settings();
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        self.configure_socket(&stream);
                        self.metrics.connection_opened();

                        let connection = Connection::new(Arc::clone(&self.bus), settings, peer);
                        let metrics = Arc::clone(&self.metrics);
                        let session_cancel = cancel.child_token();
                        sessions.spawn(async move {
                            if let Err(e) = connection.handle(stream, session_cancel).await {
                                debug!(peer = %peer, error = %e, "subscriber session ended");
                            }
                            metrics.connection_closed();
                        });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
            }
        }

        drop(self.listener);
        let open = sessions.len();
        if open > 0 {
            debug!(sessions = open, "waiting for subscriber sessions");
        }
        while sessions.join_next().await.is_some() {}

        info!("subscriber server stopped");
        Ok(())
    }
}

#[cfg(test)]
#[path = "server_test.rs"]
mod tests;
