//! Client facade over the versioned backends.

use copilot_core::{PlanRow, PolicyDocument, PolicySnapshot, Session, UniverseConfig};
use std::sync::Arc;
use tracing::info;

use crate::config::ClientConfig;
use crate::endpoints;
use crate::error::ClientResult;
use crate::fallback::Fallback;
use crate::http::ApiClient;
use crate::source::{PlanSource, PolicySource, SessionSource};
use crate::v1::V1Backend;
use crate::v2::V2Backend;

/// v2 preferred, v1 on any v2 failure.
pub type VersionedBackend = Fallback<V2Backend, V1Backend>;

/// Entry point for everything the Co-Pilot reads from or writes to the backend.
#[derive(Debug, Clone)]
pub struct CopilotClient {
    api: ApiClient,
    backend: Arc<VersionedBackend>,
    plan_top: u32,
}

impl CopilotClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let api = ApiClient::new(config.base_url.clone(), config.timeout())?;
        let backend = Fallback::new(V2Backend::new(api.clone()), V1Backend::new(api.clone()));

        info!(base_url = %api.base_url(), plan_top = config.plan_top, "Co-Pilot client created");

        Ok(Self {
            api,
            backend: Arc::new(backend),
            plan_top: config.plan_top,
        })
    }

    /// Raw HTTP access, for the opaque peripheral endpoints.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Shared backend, usable wherever a capability trait is expected.
    pub fn backend(&self) -> Arc<VersionedBackend> {
        Arc::clone(&self.backend)
    }

    pub fn plan_top(&self) -> u32 {
        self.plan_top
    }

    pub async fn fetch_session(&self) -> ClientResult<Session> {
        self.backend.fetch_session().await
    }

    /// Plan rows using the configured row count.
    pub async fn fetch_plan_rows(&self) -> ClientResult<Vec<PlanRow>> {
        self.backend.fetch_plan_rows(self.plan_top).await
    }

    pub async fn fetch_plan_rows_top(&self, top: u32) -> ClientResult<Vec<PlanRow>> {
        self.backend.fetch_plan_rows(top).await
    }

    pub async fn load_policy(&self) -> ClientResult<PolicySnapshot> {
        self.backend.load_policy().await
    }

    pub async fn save_policy(&self, body: &PolicyDocument) -> ClientResult<PolicySnapshot> {
        self.backend.save_policy(body).await
    }

    pub async fn get_config(&self) -> ClientResult<UniverseConfig> {
        let raw = self.api.get_json(endpoints::CONFIG, &[]).await?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Write the universe config and return what the backend now holds.
    ///
    /// The POST only acknowledges; the canonical value comes from a follow-up GET.
    pub async fn set_config(&self, config: &UniverseConfig) -> ClientResult<UniverseConfig> {
        self.api.post_ignore_body(endpoints::CONFIG, config).await?;
        self.get_config().await
    }
}
