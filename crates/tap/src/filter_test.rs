//! Tests for FilterHandle and SampleFilter

use super::*;
use crate::testing::Recorder;
use chrono::{FixedOffset, TimeZone};
use parking_lot::Mutex;

fn event(host: &str, category: &str, has_instances: bool) -> CategoryEvent {
    let ts = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .unwrap();
    CategoryEvent::new(host, category, has_instances, ts)
}

fn active_filter() -> (SampleFilter<Recorder>, FilterHandle, Arc<Mutex<Vec<String>>>) {
    let (recorder, log) = Recorder::new();
    let handle = FilterHandle::new();
    handle.start();
    (SampleFilter::new(handle.clone(), recorder), handle, log)
}

// ============================================================================
// FilterHandle
// ============================================================================

#[test]
fn test_new_filter_matches_all_but_is_inactive() {
    let handle = FilterHandle::new();
    assert!(!handle.is_active());
    for field in FilterField::ALL {
        assert_eq!(handle.pattern(field), MATCH_ALL);
    }
}

#[test]
fn test_invalid_pattern_keeps_previous() {
    let handle = FilterHandle::new();
    handle.set_counters("^Bytes").unwrap();

    let err = handle.set_counters("(unclosed").unwrap_err();
    assert!(matches!(
        err,
        TapError::InvalidFilterPattern { field: "counters", ref pattern, .. } if pattern == "(unclosed"
    ));
    assert_eq!(handle.pattern(FilterField::Counters), "^Bytes");
}

#[test]
fn test_clones_share_state() {
    let handle = FilterHandle::new();
    let other = handle.clone();
    other.set_hosts("^web").unwrap();
    other.start();

    assert_eq!(handle.pattern(FilterField::Hosts), "^web");
    assert!(handle.is_active());
}

// ============================================================================
// SampleFilter forwarding
// ============================================================================

#[tokio::test]
async fn test_inactive_filter_forwards_nothing() {
    let (recorder, log) = Recorder::new();
    let mut filter = SampleFilter::new(FilterHandle::new(), recorder);

    filter.category(&event("h1", "Memory", false)).await.unwrap();
    filter.data("Free Bytes", 1.0).await.unwrap();

    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_counter_pattern() {
    let (mut filter, handle, log) = active_filter();
    handle.set_counters("^% Processor.*").unwrap();

    filter.category(&event("h1", "Processor", false)).await.unwrap();
    filter.data("Available Bytes", 1.0).await.unwrap();
    filter.data("% Processor Time", 12.5).await.unwrap();

    assert_eq!(*log.lock(), vec!["cat Processor", "data % Processor Time=12.5"]);
}

#[tokio::test]
async fn test_host_and_category_gate_the_batch() {
    let (mut filter, handle, log) = active_filter();
    handle.set_hosts("^h1$").unwrap();
    handle.set_categories("^Memory$").unwrap();

    filter.category(&event("h2", "Memory", false)).await.unwrap();
    filter.data("Free Bytes", 1.0).await.unwrap();
    filter.category(&event("h1", "System", false)).await.unwrap();
    filter.data("System Up Time", 2.0).await.unwrap();
    filter.category(&event("h1", "Memory", false)).await.unwrap();
    filter.data("Free Bytes", 3.0).await.unwrap();

    assert_eq!(*log.lock(), vec!["cat Memory", "data Free Bytes=3"]);
}

#[tokio::test]
async fn test_instance_pattern() {
    let (mut filter, handle, log) = active_filter();
    handle.set_instances("^_Total$").unwrap();

    filter.category(&event("h1", "Processor", true)).await.unwrap();
    filter
        .instance_data("% Processor Time", "0", 10.0)
        .await
        .unwrap();
    filter
        .instance_data("% Processor Time", "_Total", 11.0)
        .await
        .unwrap();

    assert_eq!(
        *log.lock(),
        vec!["cat Processor", "data % Processor Time(_Total)=11"]
    );
}

#[tokio::test]
async fn test_category_decision_held_until_next_category() {
    let (mut filter, handle, log) = active_filter();

    filter.category(&event("h1", "Memory", false)).await.unwrap();
    // narrowing hosts mid-batch does not retract the current batch
    handle.set_hosts("^other$").unwrap();
    filter.data("Free Bytes", 1.0).await.unwrap();
    filter.category(&event("h1", "Memory", false)).await.unwrap();
    filter.data("Free Bytes", 2.0).await.unwrap();

    assert_eq!(*log.lock(), vec!["cat Memory", "data Free Bytes=1"]);
}

// ============================================================================
// start / stop
// ============================================================================

#[tokio::test]
async fn test_stop_then_start_reproduces_matching() {
    let (mut filter, handle, log) = active_filter();
    handle.set_counters("Bytes").unwrap();

    filter.category(&event("h1", "Memory", false)).await.unwrap();
    filter.data("Free Bytes", 1.0).await.unwrap();
    handle.stop();
    filter.data("Free Bytes", 2.0).await.unwrap();
    handle.start();
    filter.data("Free Bytes", 3.0).await.unwrap();
    filter.data("Pages/sec", 4.0).await.unwrap();

    assert_eq!(
        *log.lock(),
        vec!["cat Memory", "data Free Bytes=1", "data Free Bytes=3"]
    );
}

#[tokio::test]
async fn test_start_mid_batch_waits_for_next_category() {
    let (recorder, log) = Recorder::new();
    let handle = FilterHandle::new();
    let mut filter = SampleFilter::new(handle.clone(), recorder);

    filter.category(&event("h1", "Memory", false)).await.unwrap();
    handle.start();
    filter.data("Free Bytes", 1.0).await.unwrap();
    filter.category(&event("h1", "Memory", false)).await.unwrap();
    filter.data("Free Bytes", 2.0).await.unwrap();

    assert_eq!(*log.lock(), vec!["cat Memory", "data Free Bytes=2"]);
}

#[tokio::test]
async fn test_setting_same_pattern_twice_is_idempotent() {
    let (mut filter, handle, log) = active_filter();
    handle.set_counters("^Free").unwrap();
    handle.set_counters("^Free").unwrap();

    filter.category(&event("h1", "Memory", false)).await.unwrap();
    filter.data("Free Bytes", 1.0).await.unwrap();
    filter.data("Used Bytes", 2.0).await.unwrap();

    assert_eq!(*log.lock(), vec!["cat Memory", "data Free Bytes=1"]);
}

#[tokio::test]
async fn test_downstream_error_propagates() {
    let (recorder, _log) = Recorder::failing_on("Free Bytes");
    let handle = FilterHandle::new();
    handle.start();
    let mut filter = SampleFilter::new(handle, recorder);

    filter.category(&event("h1", "Memory", false)).await.unwrap();
    assert!(filter.data("Free Bytes", 1.0).await.is_err());
}

#[tokio::test]
async fn test_close_reaches_downstream() {
    let (mut filter, _handle, log) = active_filter();
    filter.close().await;
    assert_eq!(*log.lock(), vec!["close"]);
}
