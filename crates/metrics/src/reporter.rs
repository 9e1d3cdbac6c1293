//! Periodic metrics reporter
//!
//! Collects snapshots from the registered providers at the configured
//! interval and logs them through `tracing`.

use crate::format::MetricsFormatter;
use crate::{
    CollectedMetrics, HumanFormatter, JsonFormatter, PollMetricsProvider, TapMetricsProvider,
};
use perftap_config::{MetricsConfig, MetricsFormat};
use std::sync::Arc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Builder for constructing a MetricsReporter
#[derive(Default)]
pub struct MetricsReporterBuilder {
    config: Option<MetricsConfig>,
    tap: Option<Arc<dyn TapMetricsProvider>>,
    poll: Option<Arc<dyn PollMetricsProvider>>,
}

impl MetricsReporterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metrics configuration
    pub fn config(mut self, config: MetricsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the subscriber-side provider
    pub fn tap(mut self, provider: Arc<dyn TapMetricsProvider>) -> Self {
        self.tap = Some(provider);
        self
    }

    /// Set the poll-side provider
    pub fn poll(mut self, provider: Arc<dyn PollMetricsProvider>) -> Self {
        self.poll = Some(provider);
        self
    }

    pub fn build(self) -> MetricsReporter {
        let config = self.config.unwrap_or_default();
        let formatter: Box<dyn MetricsFormatter> = match config.format {
            MetricsFormat::Human => Box::new(HumanFormatter::new()),
            MetricsFormat::Json => Box::new(JsonFormatter::new()),
        };

        MetricsReporter {
            config,
            formatter,
            tap: self.tap,
            poll: self.poll,
            previous: None,
        }
    }
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    config: MetricsConfig,
    formatter: Box<dyn MetricsFormatter>,
    tap: Option<Arc<dyn TapMetricsProvider>>,
    poll: Option<Arc<dyn PollMetricsProvider>>,
    previous: Option<CollectedMetrics>,
}

impl MetricsReporter {
    pub fn builder() -> MetricsReporterBuilder {
        MetricsReporterBuilder::new()
    }

    /// Run the reporter until cancellation
    pub async fn run(mut self, cancel: CancellationToken) {
        if !self.config.enabled {
            info!("metrics reporting disabled");
            return;
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately; there is nothing to report yet
        ticker.tick().await;

        info!(
            interval_secs = self.config.interval.as_secs(),
            format = ?self.config.format,
            "metrics reporter started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    for line in self.render().lines() {
                        info!("{}", line);
                    }
                }
            }
        }
    }

    /// Collect once and format against the previous collection
    fn render(&mut self) -> String {
        let metrics = self.collect();
        let deltas = self.previous.as_ref().and_then(|prev| metrics.deltas(prev));
        let output = self.formatter.format(&metrics, deltas.as_ref());
        self.previous = Some(metrics);
        output
    }

    fn collect(&self) -> CollectedMetrics {
        let mut metrics = CollectedMetrics::new();

        if self.config.include_tap
            && let Some(ref provider) = self.tap
        {
            metrics.tap = Some(provider.tap_snapshot());
        }

        if self.config.include_poll
            && let Some(ref provider) = self.poll
        {
            metrics.poll = Some(provider.poll_snapshot());
        }

        metrics
    }
}
