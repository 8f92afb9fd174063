//! v1 backend: legacy, unrevisioned endpoints.

use async_trait::async_trait;
use copilot_core::{PlanRow, PolicyDocument, PolicySnapshot, Session, SessionV1};
use serde_json::Value;

use crate::endpoints;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::source::{PlanSource, PolicySource, SessionSource};

/// Client for the legacy `/api/...` schema.
#[derive(Debug, Clone)]
pub struct V1Backend {
    api: ApiClient,
}

impl V1Backend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

/// Rows from the `{data: [...]}` envelope; absent or non-array data is empty.
pub(crate) fn plan_rows_from_envelope(payload: &Value) -> Vec<PlanRow> {
    payload
        .get("data")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().cloned().map(PlanRow::new).collect())
        .unwrap_or_default()
}

#[async_trait]
impl SessionSource for V1Backend {
    async fn fetch_session(&self) -> ClientResult<Session> {
        let raw = self.api.get_json(endpoints::V1_SESSION, &[]).await?;
        let session: SessionV1 = serde_json::from_value(raw)
            .map_err(|e| ClientError::Shape(format!("v1 session: {e}")))?;
        Ok(Session::from_v1(session))
    }
}

#[async_trait]
impl PlanSource for V1Backend {
    async fn fetch_plan_rows(&self, top: u32) -> ClientResult<Vec<PlanRow>> {
        let raw = self
            .api
            .get_json(endpoints::V1_PLAN, &[("top", top.to_string())])
            .await?;
        Ok(plan_rows_from_envelope(&raw))
    }
}

#[async_trait]
impl PolicySource for V1Backend {
    /// The v1 endpoint returns the policy object itself.
    async fn load_policy(&self) -> ClientResult<PolicySnapshot> {
        let raw = self.api.get_json(endpoints::V1_POLICY, &[]).await?;
        let body = PolicyDocument::from_value(raw)
            .ok_or_else(|| ClientError::Shape("v1 policy is not an object".to_string()))?;
        Ok(PolicySnapshot { rev: None, body })
    }

    /// v1 gives no canonical echo, so the local body is returned as saved.
    async fn save_policy(&self, body: &PolicyDocument) -> ClientResult<PolicySnapshot> {
        self.api.post_ignore_body(endpoints::V1_POLICY, body).await?;
        Ok(PolicySnapshot {
            rev: None,
            body: body.clone(),
        })
    }
}
