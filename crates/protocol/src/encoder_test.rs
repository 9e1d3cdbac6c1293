//! Tests for WireEncoder

use super::*;
use crate::event::DataEvent;
use chrono::{DateTime, FixedOffset, TimeZone};

fn ts() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
        .unwrap()
}

fn category(host: &str, name: &str, has_instances: bool) -> CategoryEvent {
    CategoryEvent::new(host, name, has_instances, ts())
}

fn lines(out: &str) -> Vec<&str> {
    out.lines().collect()
}

// ============================================================================
// Catalog allocation
// ============================================================================

#[test]
fn test_processor_scenario() {
    let mut encoder = WireEncoder::default();
    let mut out = String::new();

    encoder.encode_category(&category("h1", "Processor", true), &mut out);
    encoder
        .encode_instance_data("% Processor Time", "0", 12.5, &mut out)
        .unwrap();

    assert_eq!(
        lines(&out),
        vec![
            "C 0 h1",
            "C 0.0 Processor",
            "T 20240501 123000",
            "C 0.0.0 % Processor Time",
            "C 0.0.0.0 0",
            "D 0.0.0.0 12.5",
        ]
    );
}

#[test]
fn test_catalog_lines_only_on_first_occurrence() {
    let mut encoder = WireEncoder::default();

    let replay = |encoder: &mut WireEncoder| {
        let mut out = String::new();
        encoder.encode_category(&category("h1", "Memory", false), &mut out);
        encoder.encode_data("Available Bytes", 1024.0, &mut out).unwrap();
        encoder.encode_data("Used Bytes", 2048.0, &mut out).unwrap();
        encoder.encode_category(&category("h1", "Processor", true), &mut out);
        encoder
            .encode_instance_data("% Processor Time", "0", 10.0, &mut out)
            .unwrap();
        encoder
            .encode_instance_data("% Processor Time", "1", 20.0, &mut out)
            .unwrap();
        out
    };

    let first = replay(&mut encoder);
    let second = replay(&mut encoder);

    let first_catalog = first.lines().filter(|l| l.starts_with("C ")).count();
    assert_eq!(first_catalog, 8);

    assert!(second.lines().all(|l| !l.starts_with("C ")));
    assert_eq!(
        lines(&second),
        vec![
            "T 20240501 123000",
            "D 0.0.0 1024",
            "D 0.0.1 2048",
            "T 20240501 123000",
            "D 0.1.0.0 10",
            "D 0.1.0.1 20",
        ]
    );

    let data_first: Vec<_> = first.lines().filter(|l| l.starts_with("D ")).collect();
    let data_second: Vec<_> = second.lines().filter(|l| l.starts_with("D ")).collect();
    assert_eq!(data_first, data_second);
}

#[test]
fn test_hosts_get_sequential_ids() {
    let mut encoder = WireEncoder::default();
    let mut out = String::new();

    encoder.encode_category(&category("alpha", "Memory", false), &mut out);
    encoder.encode_category(&category("beta", "Memory", false), &mut out);
    encoder.encode_category(&category("alpha", "Memory", false), &mut out);

    let catalog: Vec<_> = out.lines().filter(|l| l.starts_with("C ")).collect();
    assert_eq!(
        catalog,
        vec!["C 0 alpha", "C 0.0 Memory", "C 1 beta", "C 1.0 Memory"]
    );
    assert_eq!(encoder.host_count(), 2);
}

#[test]
fn test_instance_buckets_do_not_share_paths() {
    let mut encoder = WireEncoder::default();
    let mut out = String::new();

    encoder.encode_category(&category("h1", "Disk", false), &mut out);
    encoder.encode_category(&category("h1", "Disk", true), &mut out);

    let catalog: Vec<_> = out.lines().filter(|l| l.starts_with("C ")).collect();
    assert_eq!(catalog, vec!["C 0 h1", "C 0.0 Disk", "C 0.1 Disk"]);
}

#[test]
fn test_counter_ids_scoped_per_category() {
    let mut encoder = WireEncoder::default();
    let mut out = String::new();

    encoder.encode_category(&category("h1", "Memory", false), &mut out);
    encoder.encode_data("Available Bytes", 1.0, &mut out).unwrap();
    encoder.encode_category(&category("h1", "System", false), &mut out);
    encoder.encode_data("System Up Time", 2.0, &mut out).unwrap();

    assert!(out.contains("C 0.0.0 Available Bytes\n"));
    assert!(out.contains("C 0.1.0 System Up Time\n"));
}

#[test]
fn test_instance_ids_scoped_per_counter() {
    let mut encoder = WireEncoder::default();
    let mut out = String::new();

    encoder.encode_category(&category("h1", "Network Interface", true), &mut out);
    encoder
        .encode_instance_data("Bytes Sent/sec", "eth1", 1.0, &mut out)
        .unwrap();
    encoder
        .encode_instance_data("Bytes Received/sec", "eth0", 2.0, &mut out)
        .unwrap();
    encoder
        .encode_instance_data("Bytes Received/sec", "eth1", 3.0, &mut out)
        .unwrap();

    assert!(out.contains("C 0.0.0.0 eth1\n"));
    assert!(out.contains("C 0.0.1.0 eth0\n"));
    assert!(out.contains("C 0.0.1.1 eth1\n"));
    assert!(out.ends_with("D 0.0.1.1 3\n"));
}

#[test]
fn test_timestamp_offset_option() {
    let mut encoder = WireEncoder::new(EncoderOptions {
        timestamp_offset: true,
    });
    let mut out = String::new();

    encoder.encode_category(&category("h1", "Memory", false), &mut out);
    assert!(out.contains("T 20240501 123000 +0000\n"));
}

#[test]
fn test_names_with_line_breaks_are_flattened() {
    let mut encoder = WireEncoder::default();
    let mut out = String::new();

    encoder.encode_category(&category("h1", "Bad\nName", false), &mut out);
    assert!(out.contains("C 0.0 Bad Name\n"));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_data_without_category_fails() {
    let mut encoder = WireEncoder::default();
    let mut out = String::new();

    let result = encoder.encode_data("Available Bytes", 1.0, &mut out);
    assert!(matches!(
        result,
        Err(ProtocolError::NoActiveCategory { ref counter }) if counter == "Available Bytes"
    ));
    assert!(out.is_empty());
}

#[test]
fn test_instance_shape_mismatch_fails() {
    let mut encoder = WireEncoder::default();
    let mut out = String::new();

    encoder.encode_category(&category("h1", "Memory", false), &mut out);
    let result = encoder.encode_instance_data("Available Bytes", "0", 1.0, &mut out);
    assert!(matches!(result, Err(ProtocolError::InstanceMismatch { .. })));

    encoder.encode_category(&category("h1", "Processor", true), &mut out);
    let result = encoder.encode_data("% Processor Time", 1.0, &mut out);
    assert!(matches!(result, Err(ProtocolError::InstanceMismatch { .. })));
}

#[test]
fn test_encode_dispatches_on_variant() {
    let mut encoder = WireEncoder::default();
    let mut out = String::new();

    encoder
        .encode(&SampleEvent::Category(category("h1", "Processor", true)), &mut out)
        .unwrap();
    encoder
        .encode(
            &SampleEvent::Data(DataEvent::with_instance("% Processor Time", "_Total", 3.5)),
            &mut out,
        )
        .unwrap();

    assert!(out.ends_with("D 0.0.0.0 3.5\n"));
}
