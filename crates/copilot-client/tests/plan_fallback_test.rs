//! Plan fetch and universe config against the fixture backend.

mod integration;
use integration::common::mock_backend::{MockBackend, Reply};

use copilot_client::{ClientConfig, CopilotClient};
use copilot_core::{parse_pinned, Readiness, UniverseConfig};
use serde_json::json;

fn client_for(backend: &MockBackend) -> CopilotClient {
    CopilotClient::new(&ClientConfig::with_base_url(backend.url())).unwrap()
}

#[tokio::test]
async fn test_v2_plan_array_is_used() {
    let backend = MockBackend::start().await;
    backend.get(
        "/api/v2/plan",
        Reply::Json(json!([
            { "symbol": "INFY", "side": "long", "score": 0.82, "readiness": "Ready" },
            { "symbol": "TCS", "side": "short", "score": 0.61 }
        ])),
    );

    let rows = client_for(&backend).fetch_plan_rows().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].readiness(), Some(Readiness::Ready));

    let hits = backend.hits_for("GET", "/api/v2/plan");
    assert_eq!(hits[0].query.as_deref(), Some("top=10"));
    assert!(backend.hits_for("GET", "/api/plan").is_empty());

    backend.shutdown().await;
}

#[tokio::test]
async fn test_v2_plan_non_array_uses_v1_data() {
    let backend = MockBackend::start().await;
    backend.get("/api/v2/plan", Reply::Json(json!({ "detail": "Not Found" })));
    backend.get(
        "/api/plan",
        Reply::Json(json!({ "ok": true, "data": [{ "symbol": "SBIN" }] })),
    );

    let rows = client_for(&backend).fetch_plan_rows_top(25).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].symbol(), Some("SBIN"));
    assert_eq!(
        backend.hits_for("GET", "/api/plan")[0].query.as_deref(),
        Some("top=25")
    );

    backend.shutdown().await;
}

#[tokio::test]
async fn test_v1_plan_without_data_is_empty() {
    let backend = MockBackend::start().await;
    backend.get("/api/v2/plan", Reply::Status(404));
    backend.get("/api/plan", Reply::Json(json!({ "ok": true })));

    let rows = client_for(&backend).fetch_plan_rows().await.unwrap();
    assert!(rows.is_empty());

    backend.shutdown().await;
}

#[tokio::test]
async fn test_set_config_posts_then_reads_back() {
    let backend = MockBackend::start().await;
    backend.post("/api/config", Reply::Json(json!({ "ok": true })));
    backend.get(
        "/api/config",
        Reply::Json(json!({ "pinned": ["RELIANCE", "NSE:INFY"], "universe_limit": 200 })),
    );

    let wanted = UniverseConfig {
        pinned: parse_pinned("RELIANCE, NSE:INFY"),
        universe_limit: 200,
    };
    let stored = client_for(&backend).set_config(&wanted).await.unwrap();
    assert_eq!(stored, wanted);

    let posted = backend.hits_for("POST", "/api/config");
    assert_eq!(
        posted[0].body,
        Some(json!({ "pinned": ["RELIANCE", "NSE:INFY"], "universe_limit": 200 }))
    );

    backend.shutdown().await;
}

#[tokio::test]
async fn test_hint_reads_nested_text() {
    let backend = MockBackend::start().await;
    backend.post(
        "/api/hint",
        Reply::Json(json!({ "ok": true, "data": { "hint": "VWAP reclaim with volume" } })),
    );

    let client = client_for(&backend);
    let hint = client.hint("vwap", &json!({ "symbol": "INFY" })).await.unwrap();
    assert_eq!(hint, "VWAP reclaim with volume");

    backend.post("/api/hint", Reply::Json(json!({ "ok": true })));
    let hint = client.hint("vwap", &json!({})).await.unwrap();
    assert_eq!(hint, "");

    backend.shutdown().await;
}
