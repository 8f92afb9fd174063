//! v2 backend: revisioned session, plan and policy endpoints.

use async_trait::async_trait;
use copilot_core::{PlanRow, PolicyDocument, PolicySnapshot, Session, SessionV2, UniverseConfig};
use serde_json::Value;
use tracing::debug;

use crate::endpoints;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::source::{PlanSource, PolicySource, SessionSource};

/// Client for the `/api/v2/...` schema.
#[derive(Debug, Clone)]
pub struct V2Backend {
    api: ApiClient,
}

impl V2Backend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Universe limit for the session, best-effort.
    ///
    /// The v2 session does not carry it; a failing `/api/config` yields the
    /// zero-value config instead of failing the session fetch.
    async fn universe_config(&self) -> UniverseConfig {
        let result = self
            .api
            .get_json(endpoints::CONFIG, &[])
            .await
            .and_then(|v| serde_json::from_value::<UniverseConfig>(v).map_err(ClientError::from));

        match result {
            Ok(cfg) => cfg,
            Err(e) => {
                debug!(error = %e, "Config fetch failed, using zero-value universe config");
                UniverseConfig::default()
            }
        }
    }
}

/// Accept a `{rev, body}` envelope.
///
/// The payload must be an object with a `body` key; anything else means the v2
/// endpoint exists but is not serving the revisioned policy. A null `body`
/// becomes `fallback_body` (or empty).
pub(crate) fn parse_policy_envelope(
    payload: Value,
    fallback_body: Option<&PolicyDocument>,
) -> ClientResult<PolicySnapshot> {
    let Value::Object(mut envelope) = payload else {
        return Err(ClientError::Shape("policy envelope is not an object".to_string()));
    };
    let Some(body) = envelope.remove("body") else {
        return Err(ClientError::Shape("policy envelope has no body".to_string()));
    };

    let rev = envelope.get("rev").and_then(Value::as_u64);
    let body = match body {
        Value::Null => fallback_body.cloned().unwrap_or_default(),
        other => PolicyDocument::from_value(other)
            .ok_or_else(|| ClientError::Shape("policy body is not an object".to_string()))?,
    };

    Ok(PolicySnapshot { rev, body })
}

#[async_trait]
impl SessionSource for V2Backend {
    async fn fetch_session(&self) -> ClientResult<Session> {
        let raw = self.api.get_json(endpoints::V2_SESSION, &[]).await?;
        let session: SessionV2 = serde_json::from_value(raw)
            .map_err(|e| ClientError::Shape(format!("v2 session: {e}")))?;

        let cfg = self.universe_config().await;
        Ok(Session::from_v2(&session, cfg.universe_limit))
    }
}

#[async_trait]
impl PlanSource for V2Backend {
    async fn fetch_plan_rows(&self, top: u32) -> ClientResult<Vec<PlanRow>> {
        let raw = self
            .api
            .get_json(endpoints::V2_PLAN, &[("top", top.to_string())])
            .await?;

        match raw {
            Value::Array(rows) => Ok(rows.into_iter().map(PlanRow::new).collect()),
            _ => Err(ClientError::Shape("v2 plan is not an array".to_string())),
        }
    }
}

#[async_trait]
impl PolicySource for V2Backend {
    async fn load_policy(&self) -> ClientResult<PolicySnapshot> {
        let raw = self.api.get_json(endpoints::V2_POLICY, &[]).await?;
        parse_policy_envelope(raw, None)
    }

    async fn save_policy(&self, body: &PolicyDocument) -> ClientResult<PolicySnapshot> {
        let raw = self.api.post_json(endpoints::V2_POLICY, body).await?;
        parse_policy_envelope(raw, Some(body))
    }
}
