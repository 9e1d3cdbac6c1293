//! Perftap Configuration
//!
//! TOML-based configuration loading with sensible defaults. Every section
//! except `[[hosts]]` is optional.
//!
//! # Parsing
//!
//! ```
//! use perftap_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[[hosts]]\nname = \"localhost\"").unwrap();
//! assert_eq!(config.server.port, 7000);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [server]
//! port = 7000
//! write_timeout = "5s"
//!
//! [poll]
//! interval = "10s"
//!
//! [[hosts]]
//! name = "localhost"
//! categories = "^(Processor|Memory)$"
//! ```

mod error;
mod hosts;
mod logging;
mod metrics;
mod poll;
mod server;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use hosts::HostConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{MetricsConfig, MetricsFormat};
pub use poll::PollConfig;
pub use server::ServerConfig;

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Subscriber socket settings
    pub server: ServerConfig,

    /// Poll scheduler settings
    pub poll: PollConfig,

    /// Hosts to monitor
    pub hosts: Vec<HostConfig>,

    /// Logging configuration
    pub log: LogConfig,

    /// Metrics reporting configuration
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Called on load; call again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Names of the configured hosts, in file order
    pub fn host_names(&self) -> Vec<&str> {
        self.hosts.iter().map(|h| h.name.as_str()).collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
