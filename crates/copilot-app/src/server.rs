//! Metrics and snapshot HTTP server using axum.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use copilot_core::{Mode, PlanRow, Session};
use copilot_sync::{PlanSnapshot, RevisionHintStore};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::AppResult;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct ServerState {
    session_rx: watch::Receiver<Option<Session>>,
    plan_rx: watch::Receiver<Option<PlanSnapshot>>,
    hints: Arc<dyn RevisionHintStore>,
}

impl ServerState {
    pub fn new(
        session_rx: watch::Receiver<Option<Session>>,
        plan_rx: watch::Receiver<Option<PlanSnapshot>>,
        hints: Arc<dyn RevisionHintStore>,
    ) -> Self {
        Self {
            session_rx,
            plan_rx,
            hints,
        }
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        let session = self.session_rx.borrow().clone();
        let plan = self.plan_rx.borrow().clone();
        ClientSnapshot {
            mode: session.as_ref().map(|s| s.mode),
            session,
            plan_fetched_at: plan.as_ref().map(|p| p.fetched_at),
            plan_rows: plan.map(|p| p.rows).unwrap_or_default(),
            policy_rev_hint: self.hints.get().map(|h| h.value()),
        }
    }
}

/// Everything the client currently knows.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSnapshot {
    pub mode: Option<Mode>,
    pub session: Option<Session>,
    pub plan_rows: Vec<PlanRow>,
    pub plan_fetched_at: Option<DateTime<Utc>>,
    pub policy_rev_hint: Option<i64>,
}

pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/api/snapshot", get(get_snapshot))
        .with_state(state)
}

async fn get_metrics() -> Response {
    match copilot_telemetry::gather_text() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_snapshot(State(state): State<ServerState>) -> Json<ClientSnapshot> {
    Json(state.snapshot())
}

/// Serve until `cancel` fires.
pub async fn run_server(state: ServerState, port: u16, cancel: CancellationToken) -> AppResult<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Metrics server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("Metrics server stopped");
    Ok(())
}
