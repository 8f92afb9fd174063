//! Fixture backend for integration tests.
//!
//! Serves canned replies per `(method, path)` and records every request.
//! Unrouted paths answer 404, like a backend that does not know the schema.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// How a route answers.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with this JSON body.
    Json(Value),
    /// Bare status code, empty body.
    Status(u16),
    /// 200 with a body that is not JSON.
    Garbage,
    /// Never answers within any reasonable client timeout.
    Hang,
    /// Stateful v2 policy: GET returns `{rev, body}`, POST stores the body and
    /// bumps `rev`.
    PolicyV2,
    /// Stateful v1 policy: GET returns the body, POST stores it and acks.
    PolicyV1,
}

/// One recorded request.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct BackendState {
    routes: Mutex<HashMap<(String, String), Reply>>,
    hits: Mutex<Vec<Hit>>,
    policy_rev: Mutex<u64>,
    policy_body: Mutex<Value>,
}

/// A fixture backend listening on an ephemeral port.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    /// Start a backend with no routes.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(BackendState {
            policy_body: Mutex::new(json!({})),
            ..Default::default()
        });
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn route(&self, method: &str, path: &str, reply: Reply) -> &Self {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), reply);
        self
    }

    pub fn get(&self, path: &str, reply: Reply) -> &Self {
        self.route("GET", path, reply)
    }

    pub fn post(&self, path: &str, reply: Reply) -> &Self {
        self.route("POST", path, reply)
    }

    /// Seed the stateful policy.
    pub fn set_policy(&self, rev: u64, body: Value) {
        *self.state.policy_rev.lock().unwrap() = rev;
        *self.state.policy_body.lock().unwrap() = body;
    }

    pub fn policy(&self) -> (u64, Value) {
        (
            *self.state.policy_rev.lock().unwrap(),
            self.state.policy_body.lock().unwrap().clone(),
        )
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.hits.lock().unwrap().clone()
    }

    /// Requests received for `method path`.
    pub fn hits_for(&self, method: &str, path: &str) -> Vec<Hit> {
        self.hits()
            .into_iter()
            .filter(|h| h.method == method && h.path == path)
            .collect()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let body_json: Option<Value> = serde_json::from_slice(&body).ok();
    state.hits.lock().unwrap().push(Hit {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body: body_json.clone(),
    });

    let reply = state
        .routes
        .lock()
        .unwrap()
        .get(&(method.to_string(), uri.path().to_string()))
        .cloned();

    match reply {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(Reply::Json(value)) => Json(value).into_response(),
        Some(Reply::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Some(Reply::Garbage) => (StatusCode::OK, "<html>not json</html>").into_response(),
        Some(Reply::Hang) => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        Some(Reply::PolicyV2) => {
            if method == Method::POST {
                let mut rev = state.policy_rev.lock().unwrap();
                *rev += 1;
                *state.policy_body.lock().unwrap() = body_json.unwrap_or(Value::Null);
            }
            let rev = *state.policy_rev.lock().unwrap();
            let body = state.policy_body.lock().unwrap().clone();
            Json(json!({ "rev": rev, "body": body })).into_response()
        }
        Some(Reply::PolicyV1) => {
            if method == Method::POST {
                *state.policy_body.lock().unwrap() = body_json.unwrap_or(Value::Null);
                return Json(json!({ "ok": true })).into_response();
            }
            let body = state.policy_body.lock().unwrap().clone();
            Json(body).into_response()
        }
    }
}
