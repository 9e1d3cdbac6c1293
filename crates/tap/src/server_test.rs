//! Tests for the TCP server
//!
//! End-to-end sessions live in `tests/tap_server.rs`.

use super::*;
use std::time::Duration;

fn local_config(port: u16) -> ServerConfig {
    ServerConfig {
        address: "127.0.0.1".into(),
        port,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_bind_ephemeral_port() {
    let server = TapServer::bind(local_config(0), Arc::new(BroadcastBus::new()))
        .await
        .unwrap();
    assert_ne!(server.local_addr().unwrap().port(), 0);
}

#[tokio::test]
async fn test_bind_conflict_reports_address() {
    let first = TapServer::bind(local_config(0), Arc::new(BroadcastBus::new()))
        .await
        .unwrap();
    let port = first.local_addr().unwrap().port();

    let result = TapServer::bind(local_config(port), Arc::new(BroadcastBus::new())).await;
    match result {
        Err(TapError::Bind { address, .. }) => assert_eq!(address, format!("127.0.0.1:{}", port)),
        other => panic!("expected bind error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_settings_follow_config() {
    let config = ServerConfig {
        write_timeout: Duration::from_millis(750),
        timestamp_offset: true,
        ..local_config(0)
    };
    let server = TapServer::bind(config, Arc::new(BroadcastBus::new()))
        .await
        .unwrap();

    let settings = server.settings();
    assert_eq!(settings.write_timeout, Duration::from_millis(750));
    assert!(settings.encoder.timestamp_offset);
}

#[tokio::test]
async fn test_run_stops_on_cancel() {
    let server = TapServer::bind(local_config(0), Arc::new(BroadcastBus::new()))
        .await
        .unwrap();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(server.run(cancel.clone()));

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
