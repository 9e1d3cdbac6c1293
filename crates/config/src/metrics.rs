//! Metrics reporting configuration
//!
//! Controls the periodic internal-metrics report. Enabled by default so a
//! minimal config still logs connection and poll activity.

use serde::Deserialize;
use std::time::Duration;

/// Metrics output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON structured output
    Json,
}

/// Metrics configuration
///
/// # Example
///
/// ```toml
/// [metrics]
/// enabled = true
/// interval = "60s"
/// format = "human"
/// include_tap = true
/// include_poll = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics reporting
    /// Default: true
    pub enabled: bool,

    /// Reporting interval
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Output format (human, json)
    /// Default: human
    pub format: MetricsFormat,

    /// Include subscriber-side metrics (connections, deliveries, evictions)
    pub include_tap: bool,

    /// Include poll-side metrics (cycles, skipped ticks, failures)
    pub include_poll: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            format: MetricsFormat::Human,
            include_tap: true,
            include_poll: true,
        }
    }
}
