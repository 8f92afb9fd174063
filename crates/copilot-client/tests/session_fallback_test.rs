//! Session fetch against the fixture backend.
//!
//! Covers:
//! - v2 session normalization with the best-effort config lookup
//! - v2 unreachable or malformed -> v1 mapping with rev 0
//! - both versions down -> error

mod integration;
use integration::common::mock_backend::{MockBackend, Reply};

use copilot_client::{ClientConfig, ClientError, CopilotClient};
use copilot_core::Mode;
use serde_json::json;

fn client_for(backend: &MockBackend, timeout_ms: u64) -> CopilotClient {
    let config = ClientConfig {
        timeout_ms,
        ..ClientConfig::with_base_url(backend.url())
    };
    CopilotClient::new(&config).unwrap()
}

fn v1_fixture() -> serde_json::Value {
    json!({
        "zerodha": true,
        "llm": false,
        "ticker": true,
        "market_open": true,
        "stale_count": 2,
        "subscribed_count": 140,
        "universe_limit": 300,
        "server_time_ist": "2026-10-16 11:02:10",
        "mode": "LIVE"
    })
}

#[tokio::test]
async fn test_v2_session_is_normalized() {
    let backend = MockBackend::start().await;
    backend.get(
        "/api/v2/session",
        Reply::Json(json!({
            "zerodha": true,
            "llm": true,
            "ticker": true,
            "logged_in": true,
            "market_open": true,
            "window_status": "ok",
            "degraded": false,
            "snapshot_p95_age_s": 14.2,
            "time_ist": "2026-10-16T11:02:10+05:30",
            "rev": 9
        })),
    );
    backend.get(
        "/api/config",
        Reply::Json(json!({ "pinned": ["NSE:INFY"], "universe_limit": 250 })),
    );

    let session = client_for(&backend, 2_000).fetch_session().await.unwrap();
    assert_eq!(session.mode, Mode::Live);
    assert_eq!(session.rev, 9);
    assert_eq!(session.stale_count, 1);
    assert_eq!(session.subscribed_count, 0);
    assert_eq!(session.universe_limit, 250);
    assert_eq!(session.server_time_ist, "2026-10-16T11:02:10+05:30");
    assert!(backend.hits_for("GET", "/api/session").is_empty());

    backend.shutdown().await;
}

#[tokio::test]
async fn test_v2_session_survives_config_failure() {
    let backend = MockBackend::start().await;
    backend.get(
        "/api/v2/session",
        Reply::Json(json!({
            "market_open": true,
            "window_status": "early",
            "ticker": true,
            "snapshot_p95_age_s": 3,
            "rev": 5
        })),
    );
    backend.get("/api/config", Reply::Status(500));

    let session = client_for(&backend, 2_000).fetch_session().await.unwrap();
    assert_eq!(session.mode, Mode::Waiting);
    assert_eq!(session.stale_count, 0);
    assert_eq!(session.rev, 5);
    assert_eq!(session.universe_limit, 0);
    assert!(backend.hits_for("GET", "/api/session").is_empty());

    backend.shutdown().await;
}

#[tokio::test]
async fn test_v2_network_error_maps_v1_fields() {
    let backend = MockBackend::start().await;
    backend.get("/api/v2/session", Reply::Hang);
    backend.get("/api/session", Reply::Json(v1_fixture()));

    let session = client_for(&backend, 300).fetch_session().await.unwrap();
    assert!(session.zerodha);
    assert!(!session.llm);
    assert!(session.ticker);
    assert_eq!(session.mode, Mode::Live);
    assert_eq!(session.stale_count, 2);
    assert_eq!(session.subscribed_count, 140);
    assert_eq!(session.universe_limit, 300);
    assert_eq!(session.server_time_ist, "2026-10-16 11:02:10");
    assert_eq!(session.rev, 0);

    backend.shutdown().await;
}

#[tokio::test]
async fn test_v2_missing_falls_back_to_v1() {
    let backend = MockBackend::start().await;
    // No v2 route: 404
    backend.get("/api/session", Reply::Json(json!({ "market_open": false })));

    let session = client_for(&backend, 2_000).fetch_session().await.unwrap();
    assert_eq!(session.mode, Mode::Historical);
    assert_eq!(session.rev, 0);
    assert!(!session.zerodha);
    assert_eq!(session.stale_count, 0);
    assert_eq!(backend.hits_for("GET", "/api/v2/session").len(), 1);

    backend.shutdown().await;
}

#[tokio::test]
async fn test_v2_garbage_body_falls_back_to_v1() {
    let backend = MockBackend::start().await;
    backend.get("/api/v2/session", Reply::Garbage);
    backend.get("/api/session", Reply::Json(v1_fixture()));

    let session = client_for(&backend, 2_000).fetch_session().await.unwrap();
    assert_eq!(session.rev, 0);
    assert_eq!(session.mode, Mode::Live);

    backend.shutdown().await;
}

#[tokio::test]
async fn test_both_versions_down_is_error() {
    let backend = MockBackend::start().await;
    backend.get("/api/v2/session", Reply::Status(503));
    backend.get("/api/session", Reply::Status(502));

    let err = client_for(&backend, 2_000).fetch_session().await.unwrap_err();
    assert!(
        matches!(err, ClientError::Status { status: 502, .. }),
        "expected the v1 error, got {err}"
    );

    backend.shutdown().await;
}
