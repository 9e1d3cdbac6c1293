//! Skip-if-busy poll scheduler

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use perftap_metrics::PollMetrics;
use perftap_sources::CounterSource;
use perftap_tap::BroadcastBus;

/// What a tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// A new cycle was spawned
    Started(JoinHandle<CycleSummary>),
    /// The previous cycle was still running; nothing was started
    Skipped,
}

impl TickOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TickOutcome::Skipped)
    }
}

/// Totals for one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub hosts_polled: usize,
    pub hosts_failed: usize,
    pub categories: usize,
    pub samples: usize,
}

struct Shared {
    sources: Mutex<Vec<Box<dyn CounterSource>>>,
    bus: Arc<BroadcastBus>,
    running: AtomicBool,
    metrics: Arc<PollMetrics>,
}

/// Clears the running flag when a cycle ends, even by panic
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives poll cycles across all monitored hosts
pub struct PollScheduler {
    shared: Arc<Shared>,
    interval: Duration,
}

impl PollScheduler {
    /// Create a scheduler over `sources`, in polling order
    pub fn new(
        sources: Vec<Box<dyn CounterSource>>,
        bus: Arc<BroadcastBus>,
        interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                sources: Mutex::new(sources),
                bus,
                running: AtomicBool::new(false),
                metrics: Arc::new(PollMetrics::new()),
            }),
            interval,
        }
    }

    /// Metrics handle for the reporter
    pub fn metrics(&self) -> Arc<PollMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    /// Whether a cycle is in flight
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Start a cycle unless one is already running
    pub fn tick(&self) -> TickOutcome {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.shared.metrics.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            warn!("skipping scheduled run - previous execution still in progress");
            return TickOutcome::Skipped;
        }

        let shared = Arc::clone(&self.shared);
        TickOutcome::Started(tokio::spawn(async move {
            let _guard = RunningGuard(&shared.running);
            run_cycle(&shared).await
        }))
    }

    /// Tick at the configured interval until cancelled
    ///
    /// On cancellation no new cycle starts; an in-flight cycle is awaited.
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "poll scheduler started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut current = None;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let TickOutcome::Started(handle) = self.tick() {
                        current = Some(handle);
                    }
                }
            }
        }

        if let Some(handle) = current {
            if !handle.is_finished() {
                info!("waiting for in-flight poll cycle");
            }
            if let Err(e) = handle.await {
                warn!(error = %e, "poll cycle task failed");
            }
        }
        info!("poll scheduler stopped");
    }
}

async fn run_cycle(shared: &Shared) -> CycleSummary {
    let mut summary = CycleSummary::default();
    let mut sources = shared.sources.lock().await;

    for source in sources.iter_mut() {
        let batches = match source.poll().await {
            Ok(batches) => batches,
            Err(e) => {
                summary.hosts_failed += 1;
                shared.metrics.poll_failures.fetch_add(1, Ordering::Relaxed);
                warn!(host = %source.host(), error = %e, "poll failed");
                continue;
            }
        };
        summary.hosts_polled += 1;

        for batch in batches {
            summary.categories += 1;
            summary.samples += batch.samples.len();
            for event in batch.into_events() {
                shared.bus.deliver(&event).await;
            }
        }
    }

    let metrics = &shared.metrics;
    metrics
        .categories_sampled
        .fetch_add(summary.categories as u64, Ordering::Relaxed);
    metrics
        .samples_emitted
        .fetch_add(summary.samples as u64, Ordering::Relaxed);
    metrics.cycles_completed.fetch_add(1, Ordering::Relaxed);

    debug!(
        hosts = summary.hosts_polled,
        failed = summary.hosts_failed,
        categories = summary.categories,
        samples = summary.samples,
        "poll cycle complete"
    );
    summary
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
