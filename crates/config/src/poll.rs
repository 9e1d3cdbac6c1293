//! Poll scheduler configuration

use serde::Deserialize;
use std::time::Duration;

/// Scheduler settings
///
/// ```toml
/// [poll]
/// interval = "10s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Period between poll cycles
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}
