//! Human-readable metrics formatter
//!
//! # Example Output
//!
//! ```text
//! [metrics] tap: 3 conn (12 total) | 3 listeners | 1.2K/s events | 0 evicted | 4 cmds
//! [metrics] poll: 6 cycles | 1 skipped | 0 failed | 42 categories | 340/s samples
//! ```

use super::{MetricsFormatter, format_count, format_rate};
use crate::{CollectedMetrics, MetricsDeltas};
use std::fmt::Write;

/// Human-readable metrics formatter
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    pub fn new() -> Self {
        Self
    }

    fn format_tap(
        &self,
        metrics: &CollectedMetrics,
        deltas: Option<&MetricsDeltas>,
    ) -> Option<String> {
        let tap = metrics.tap.as_ref()?;
        let mut output = format!(
            "[metrics] tap: {} conn ({} total) | {} listeners",
            tap.connections_active,
            format_count(tap.connections_total),
            tap.listeners_live,
        );

        match deltas.and_then(|d| d.tap.as_ref()) {
            Some(d) => {
                let _ = write!(
                    output,
                    " | {} events | {} evicted | {} cmds",
                    format_rate(d.events_per_sec),
                    d.listeners_evicted,
                    d.commands_received,
                );
                if d.invalid_patterns > 0 {
                    let _ = write!(output, " | {} bad patterns", d.invalid_patterns);
                }
            }
            None => {
                let _ = write!(
                    output,
                    " | {} events | {} evicted",
                    format_count(tap.events_delivered),
                    tap.listeners_evicted,
                );
            }
        }

        Some(output)
    }

    fn format_poll(
        &self,
        metrics: &CollectedMetrics,
        deltas: Option<&MetricsDeltas>,
    ) -> Option<String> {
        let poll = metrics.poll.as_ref()?;

        Some(match deltas.and_then(|d| d.poll.as_ref()) {
            Some(d) => format!(
                "[metrics] poll: {} cycles | {} skipped | {} failed | {} categories | {} samples",
                d.cycles_completed,
                d.ticks_skipped,
                d.poll_failures,
                format_count(d.categories_sampled),
                format_rate(d.samples_per_sec),
            ),
            None => format!(
                "[metrics] poll: {} cycles | {} skipped | {} failed | {} samples",
                poll.cycles_completed,
                poll.ticks_skipped,
                poll.poll_failures,
                format_count(poll.samples_emitted),
            ),
        })
    }
}

impl MetricsFormatter for HumanFormatter {
    fn format(&self, metrics: &CollectedMetrics, deltas: Option<&MetricsDeltas>) -> String {
        [self.format_tap(metrics, deltas), self.format_poll(metrics, deltas)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("\n")
    }
}
