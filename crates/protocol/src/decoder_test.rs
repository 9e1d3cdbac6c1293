//! Tests for WireDecoder

use super::*;
use crate::encoder::WireEncoder;
use crate::event::CategoryEvent;
use chrono::{FixedOffset, TimeZone};

#[test]
fn test_parse_id_path() {
    let path: IdPath = "0.12.3".parse().unwrap();
    assert_eq!(path.components(), &[0, 12, 3]);
    assert_eq!(path.to_string(), "0.12.3");
    assert_eq!(path.prefix(1).to_string(), "0");

    assert!("".parse::<IdPath>().is_err());
    assert!("0.x".parse::<IdPath>().is_err());
    assert!("0.1.2.3.4".parse::<IdPath>().is_err());
    assert!("-1".parse::<IdPath>().is_err());
}

#[test]
fn test_parse_lines() {
    assert_eq!(
        WireLine::parse("C 0.1 Processor Information").unwrap(),
        WireLine::Catalog {
            path: "0.1".parse().unwrap(),
            name: "Processor Information".into()
        }
    );
    assert_eq!(
        WireLine::parse("T 20240501 123000").unwrap(),
        WireLine::Time("20240501 123000".into())
    );
    assert_eq!(
        WireLine::parse("D 0.1.2 42.5").unwrap(),
        WireLine::Data {
            path: "0.1.2".parse().unwrap(),
            value: 42.5
        }
    );
    assert_eq!(
        WireLine::parse("I Hosts pattern:.*").unwrap(),
        WireLine::Info("Hosts pattern:.*".into())
    );
}

#[test]
fn test_parse_rejects_malformed() {
    assert!(WireLine::parse("").is_err());
    assert!(WireLine::parse("X 0 foo").is_err());
    assert!(WireLine::parse("C 0").is_err());
    assert!(WireLine::parse("D 0.1 5").is_err());
    assert!(WireLine::parse("D 0.1.2 five").is_err());
}

#[test]
fn test_decoder_resolves_encoder_output() {
    let ts = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
        .unwrap();
    let mut encoder = WireEncoder::default();
    let mut out = String::new();
    encoder.encode_category(&CategoryEvent::new("h1", "Processor", true, ts), &mut out);
    encoder
        .encode_instance_data("% Processor Time", "0", 12.5, &mut out)
        .unwrap();
    encoder.encode_category(&CategoryEvent::new("h1", "Memory", false, ts), &mut out);
    encoder.encode_data("Available Bytes", 4096.0, &mut out).unwrap();

    let mut decoder = WireDecoder::new();
    let samples: Vec<DecodedSample> = out
        .lines()
        .filter_map(|line| decoder.feed(line).unwrap())
        .collect();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].host, "h1");
    assert_eq!(samples[0].category, "Processor");
    assert_eq!(samples[0].counter, "% Processor Time");
    assert_eq!(samples[0].instance.as_deref(), Some("0"));
    assert_eq!(samples[0].value, 12.5);
    assert_eq!(samples[0].timestamp.as_deref(), Some("20240501 123000"));

    assert_eq!(samples[1].category, "Memory");
    assert_eq!(samples[1].counter, "Available Bytes");
    assert_eq!(samples[1].instance, None);
    assert_eq!(samples[1].value, 4096.0);
}

#[test]
fn test_decoder_rejects_undeclared_path() {
    let mut decoder = WireDecoder::new();
    decoder.feed("C 0 h1").unwrap();
    decoder.feed("C 0.0 Memory").unwrap();

    let result = decoder.feed("D 0.0.7 1");
    assert!(matches!(result, Err(ProtocolError::UndeclaredId(ref p)) if p == "0.0.7"));
}

#[test]
fn test_decoder_ignores_info() {
    let mut decoder = WireDecoder::new();
    assert!(decoder.feed("I Huh?").unwrap().is_none());
    assert_eq!(decoder.catalog_len(), 0);
}
