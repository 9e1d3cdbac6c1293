//! Perftap - Metrics
//!
//! Internal metrics collection and reporting.
//!
//! - Atomic counters for the subscriber side (`TapMetrics`) and the poll
//!   side (`PollMetrics`)
//! - Provider traits so the reporter never depends on the concrete crates
//! - A periodic reporter with human or JSON output
//!
//! # Wiring
//!
//! ```text
//! TapServer   ──► Arc<TapMetrics>  ──┐
//!                                    ├──► MetricsReporter::run(cancel)
//! PollScheduler ► Arc<PollMetrics> ──┘
//! ```
//!
//! ```ignore
//! let reporter = MetricsReporter::builder()
//!     .config(config.metrics.clone())
//!     .tap(server.metrics())
//!     .poll(scheduler.metrics())
//!     .build();
//! tokio::spawn(reporter.run(cancel.clone()));
//! ```

mod collected;
pub mod format;
mod reporter;
mod traits;

pub use collected::{CollectedMetrics, MetricsDeltas, PollDeltas, TapDeltas};
pub use format::{HumanFormatter, JsonFormatter, MetricsFormatter};
pub use reporter::{MetricsReporter, MetricsReporterBuilder};
pub use traits::{
    PollMetrics, PollMetricsProvider, PollMetricsSnapshot, TapMetrics, TapMetricsProvider,
    TapMetricsSnapshot,
};
