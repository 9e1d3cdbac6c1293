//! Per-second rates from monotonically increasing raw counters

use std::collections::HashMap;
use std::time::Instant;

/// Remembers the last raw value of each counter key
///
/// The rate is `(raw_now - raw_prev) / elapsed_seconds`. When the raw
/// value went backwards (wrap or reset) or no time passed, no rate is
/// produced and the new raw value becomes the baseline.
#[derive(Debug, Default)]
pub struct RateTracker {
    previous: HashMap<String, (u64, Instant)>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `raw` for `key` at `now` and return the rate since the last record
    pub fn rate(&mut self, key: &str, raw: u64, now: Instant) -> Option<f64> {
        let (prev_raw, prev_at) = self.previous.insert(key.to_owned(), (raw, now))?;

        let elapsed = now.checked_duration_since(prev_at)?.as_secs_f64();
        if elapsed <= 0.0 || raw < prev_raw {
            return None;
        }

        Some((raw - prev_raw) as f64 / elapsed)
    }

    /// Drop baselines whose key no longer satisfies `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.previous.retain(|key, _| keep(key));
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

#[cfg(test)]
#[path = "rate_test.rs"]
mod tests;
