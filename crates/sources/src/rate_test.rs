//! Tests for rate computation

use super::*;
use std::time::Duration;

#[test]
fn test_first_sample_only_sets_baseline() {
    let mut rates = RateTracker::new();
    assert_eq!(rates.rate("eth0/rx", 1000, Instant::now()), None);
    assert_eq!(rates.len(), 1);
}

#[test]
fn test_rate_over_elapsed_seconds() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();

    rates.rate("eth0/rx", 1000, t0);
    let rate = rates.rate("eth0/rx", 6000, t0 + Duration::from_secs(2)).unwrap();
    assert!((rate - 2500.0).abs() < 1e-9);

    // the second sample is the new baseline
    let rate = rates.rate("eth0/rx", 6500, t0 + Duration::from_millis(2500)).unwrap();
    assert!((rate - 1000.0).abs() < 1e-9);
}

#[test]
fn test_decrease_is_skipped_and_rebases() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();

    rates.rate("k", 5000, t0);
    assert_eq!(rates.rate("k", 100, t0 + Duration::from_secs(1)), None);

    let rate = rates.rate("k", 300, t0 + Duration::from_secs(2)).unwrap();
    assert!((rate - 200.0).abs() < 1e-9);
}

#[test]
fn test_zero_elapsed_is_skipped() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();

    rates.rate("k", 10, t0);
    assert_eq!(rates.rate("k", 20, t0), None);
}

#[test]
fn test_unchanged_counter_is_zero_rate() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();

    rates.rate("k", 42, t0);
    assert_eq!(rates.rate("k", 42, t0 + Duration::from_secs(10)), Some(0.0));
}

#[test]
fn test_keys_are_independent() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();

    rates.rate("a", 0, t0);
    rates.rate("b", 0, t0);
    assert_eq!(rates.rate("a", 10, t0 + Duration::from_secs(1)), Some(10.0));
    assert_eq!(rates.rate("b", 30, t0 + Duration::from_secs(1)), Some(30.0));
}

#[test]
fn test_retain_drops_vanished_keys() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();

    rates.rate("eth0/rx", 1, t0);
    rates.rate("wlan0/rx", 1, t0);
    rates.retain(|key| key.starts_with("eth0"));

    assert_eq!(rates.len(), 1);
    assert_eq!(rates.rate("wlan0/rx", 5, t0 + Duration::from_secs(1)), None);
}
