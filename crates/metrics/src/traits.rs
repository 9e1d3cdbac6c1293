//! Metrics counters and provider traits
//!
//! The tap server and the poll scheduler each own an `Arc` of their counter
//! struct and bump it with relaxed atomics. The reporter only sees them
//! through the provider traits, so it never depends on the concrete crates.

use std::sync::atomic::{AtomicU64, Ordering};

/// Subscriber-side counters
#[derive(Debug, Default)]
pub struct TapMetrics {
    /// Currently open subscriber connections
    pub connections_active: AtomicU64,
    /// Connections accepted since start
    pub connections_total: AtomicU64,
    /// Listeners currently registered on the bus (live + pending)
    pub listeners_live: AtomicU64,
    /// Events handed to listeners
    pub events_delivered: AtomicU64,
    /// Listeners removed after a delivery failure
    pub listeners_evicted: AtomicU64,
    /// Command lines received from clients
    pub commands_received: AtomicU64,
    /// Filter commands rejected for an invalid regex
    pub invalid_patterns: AtomicU64,
}

impl TapMetrics {
    pub const fn new() -> Self {
        Self {
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            listeners_live: AtomicU64::new(0),
            events_delivered: AtomicU64::new(0),
            listeners_evicted: AtomicU64::new(0),
            commands_received: AtomicU64::new(0),
            invalid_patterns: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    #[inline]
    pub fn snapshot(&self) -> TapMetricsSnapshot {
        TapMetricsSnapshot {
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            listeners_live: self.listeners_live.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            listeners_evicted: self.listeners_evicted.load(Ordering::Relaxed),
            commands_received: self.commands_received.load(Ordering::Relaxed),
            invalid_patterns: self.invalid_patterns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of subscriber-side metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TapMetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub listeners_live: u64,
    pub events_delivered: u64,
    pub listeners_evicted: u64,
    pub commands_received: u64,
    pub invalid_patterns: u64,
}

/// Poll-side counters
#[derive(Debug, Default)]
pub struct PollMetrics {
    /// Poll cycles that ran to completion
    pub cycles_completed: AtomicU64,
    /// Ticks dropped because the previous cycle was still running
    pub ticks_skipped: AtomicU64,
    /// Host polls that failed
    pub poll_failures: AtomicU64,
    /// Category batches broadcast
    pub categories_sampled: AtomicU64,
    /// Data samples broadcast
    pub samples_emitted: AtomicU64,
}

impl PollMetrics {
    pub const fn new() -> Self {
        Self {
            cycles_completed: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            poll_failures: AtomicU64::new(0),
            categories_sampled: AtomicU64::new(0),
            samples_emitted: AtomicU64::new(0),
        }
    }

    /// Take a snapshot of current values
    #[inline]
    pub fn snapshot(&self) -> PollMetricsSnapshot {
        PollMetricsSnapshot {
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
            categories_sampled: self.categories_sampled.load(Ordering::Relaxed),
            samples_emitted: self.samples_emitted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of poll-side metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PollMetricsSnapshot {
    pub cycles_completed: u64,
    pub ticks_skipped: u64,
    pub poll_failures: u64,
    pub categories_sampled: u64,
    pub samples_emitted: u64,
}

/// Anything that can report subscriber-side metrics
pub trait TapMetricsProvider: Send + Sync {
    fn tap_snapshot(&self) -> TapMetricsSnapshot;
}

/// Anything that can report poll-side metrics
pub trait PollMetricsProvider: Send + Sync {
    fn poll_snapshot(&self) -> PollMetricsSnapshot;
}

impl TapMetricsProvider for TapMetrics {
    fn tap_snapshot(&self) -> TapMetricsSnapshot {
        self.snapshot()
    }
}

impl PollMetricsProvider for PollMetrics {
    fn poll_snapshot(&self) -> PollMetricsSnapshot {
        self.snapshot()
    }
}
