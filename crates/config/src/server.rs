//! Subscriber server configuration

use serde::Deserialize;
use std::time::Duration;

/// Listening socket and per-subscriber settings
///
/// # Example
///
/// ```toml
/// [server]
/// address = "0.0.0.0"
/// port = 7000
/// write_timeout = "5s"
/// nodelay = true
/// timestamp_offset = false
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    /// Default: "0.0.0.0"
    pub address: String,

    /// Listen port
    /// Default: 7000
    pub port: u16,

    /// Timeout applied to every write to a subscriber socket
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// Enable TCP_NODELAY on accepted sockets
    /// Default: true
    pub nodelay: bool,

    /// Append the UTC offset (` +hhmm`) to `T` lines
    /// Default: false
    pub timestamp_offset: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 7000,
            write_timeout: Duration::from_secs(5),
            nodelay: true,
            timestamp_offset: false,
        }
    }
}

impl ServerConfig {
    /// `address:port` string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 7000);
        assert_eq!(config.write_timeout, Duration::from_secs(5));
        assert!(config.nodelay);
        assert!(!config.timestamp_offset);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig = toml::from_str("port = 7100\nwrite_timeout = \"250ms\"").unwrap();
        assert_eq!(config.port, 7100);
        assert_eq!(config.write_timeout, Duration::from_millis(250));
        assert_eq!(config.address, "0.0.0.0");
    }

    #[test]
    fn test_bind_address() {
        let config = ServerConfig {
            address: "127.0.0.1".into(),
            port: 7001,
            ..Default::default()
        };
        assert_eq!(config.bind_address(), "127.0.0.1:7001");
    }
}
