//! Collected metrics snapshot and interval deltas

use crate::{PollMetricsSnapshot, TapMetricsSnapshot};
use std::time::Instant;

/// All provider snapshots at one point in time
#[derive(Debug, Clone, Default)]
pub struct CollectedMetrics {
    /// When this collection was taken
    pub timestamp: Option<Instant>,
    pub tap: Option<TapMetricsSnapshot>,
    pub poll: Option<PollMetricsSnapshot>,
}

impl CollectedMetrics {
    /// Create a new empty collection stamped now
    pub fn new() -> Self {
        Self {
            timestamp: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Changes since a previous collection
    ///
    /// Returns None when either timestamp is missing or no time has passed.
    pub fn deltas(&self, previous: &CollectedMetrics) -> Option<MetricsDeltas> {
        let elapsed = self.timestamp?.duration_since(previous.timestamp?);
        if elapsed.is_zero() {
            return None;
        }
        let elapsed_secs = elapsed.as_secs_f64();

        let tap = match (&self.tap, &previous.tap) {
            (Some(current), Some(prev)) => Some(TapDeltas {
                connections_opened: delta(current.connections_total, prev.connections_total),
                events_delivered: delta(current.events_delivered, prev.events_delivered),
                events_per_sec: rate(current.events_delivered, prev.events_delivered, elapsed_secs),
                listeners_evicted: delta(current.listeners_evicted, prev.listeners_evicted),
                commands_received: delta(current.commands_received, prev.commands_received),
                invalid_patterns: delta(current.invalid_patterns, prev.invalid_patterns),
            }),
            _ => None,
        };

        let poll = match (&self.poll, &previous.poll) {
            (Some(current), Some(prev)) => Some(PollDeltas {
                cycles_completed: delta(current.cycles_completed, prev.cycles_completed),
                ticks_skipped: delta(current.ticks_skipped, prev.ticks_skipped),
                poll_failures: delta(current.poll_failures, prev.poll_failures),
                categories_sampled: delta(current.categories_sampled, prev.categories_sampled),
                samples_per_sec: rate(current.samples_emitted, prev.samples_emitted, elapsed_secs),
            }),
            _ => None,
        };

        Some(MetricsDeltas {
            elapsed_secs,
            tap,
            poll,
        })
    }
}

/// Changes over one reporting interval
#[derive(Debug, Clone, Default)]
pub struct MetricsDeltas {
    pub elapsed_secs: f64,
    pub tap: Option<TapDeltas>,
    pub poll: Option<PollDeltas>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TapDeltas {
    pub connections_opened: u64,
    pub events_delivered: u64,
    pub events_per_sec: f64,
    pub listeners_evicted: u64,
    pub commands_received: u64,
    pub invalid_patterns: u64,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PollDeltas {
    pub cycles_completed: u64,
    pub ticks_skipped: u64,
    pub poll_failures: u64,
    pub categories_sampled: u64,
    pub samples_per_sec: f64,
}

#[inline]
fn delta(current: u64, previous: u64) -> u64 {
    current.saturating_sub(previous)
}

#[inline]
fn rate(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    delta(current, previous) as f64 / elapsed_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn collected_at(at: Instant, events: u64, skipped: u64) -> CollectedMetrics {
        CollectedMetrics {
            timestamp: Some(at),
            tap: Some(TapMetricsSnapshot {
                events_delivered: events,
                ..Default::default()
            }),
            poll: Some(PollMetricsSnapshot {
                ticks_skipped: skipped,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_deltas_over_interval() {
        let start = Instant::now();
        let previous = collected_at(start, 100, 1);
        let current = collected_at(start + Duration::from_secs(10), 600, 3);

        let deltas = current.deltas(&previous).unwrap();
        assert_eq!(deltas.elapsed_secs, 10.0);

        let tap = deltas.tap.unwrap();
        assert_eq!(tap.events_delivered, 500);
        assert_eq!(tap.events_per_sec, 50.0);
        assert_eq!(deltas.poll.unwrap().ticks_skipped, 2);
    }

    #[test]
    fn test_no_deltas_without_elapsed_time() {
        let now = Instant::now();
        let a = collected_at(now, 1, 0);
        assert!(a.deltas(&a.clone()).is_none());
        assert!(a.deltas(&CollectedMetrics::default()).is_none());
    }

    #[test]
    fn test_counter_reset_saturates() {
        let start = Instant::now();
        let previous = collected_at(start, 900, 0);
        let current = collected_at(start + Duration::from_secs(1), 10, 0);

        let tap = current.deltas(&previous).unwrap().tap.unwrap();
        assert_eq!(tap.events_delivered, 0);
    }
}
