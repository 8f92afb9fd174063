//! Capability traits.
//!
//! Each backend generation implements the capabilities it serves. Callers
//! depend on the traits, never on a schema version.

use async_trait::async_trait;
use copilot_core::{PlanRow, PolicyDocument, PolicySnapshot, Session};
use serde_json::Value;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::error::ClientResult;

/// Source of normalized session state.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn fetch_session(&self) -> ClientResult<Session>;
}

/// Source of ranked trading candidates.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PlanSource: Send + Sync {
    /// Fetch the top `top` rows.
    async fn fetch_plan_rows(&self, top: u32) -> ClientResult<Vec<PlanRow>>;
}

/// Load/save access to the policy document.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PolicySource: Send + Sync {
    async fn load_policy(&self) -> ClientResult<PolicySnapshot>;

    /// Persist `body`. The returned snapshot is what the caller should hold
    /// afterwards.
    async fn save_policy(&self, body: &PolicyDocument) -> ClientResult<PolicySnapshot>;
}

/// Short explanations for displayed metrics.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HintSource: Send + Sync {
    /// Hint text for `metric`, empty when the backend has none.
    async fn fetch_hint(&self, metric: &str, context: &Value) -> ClientResult<String>;
}

#[async_trait]
impl<T: SessionSource + ?Sized> SessionSource for Arc<T> {
    async fn fetch_session(&self) -> ClientResult<Session> {
        (**self).fetch_session().await
    }
}

#[async_trait]
impl<T: PlanSource + ?Sized> PlanSource for Arc<T> {
    async fn fetch_plan_rows(&self, top: u32) -> ClientResult<Vec<PlanRow>> {
        (**self).fetch_plan_rows(top).await
    }
}

#[async_trait]
impl<T: PolicySource + ?Sized> PolicySource for Arc<T> {
    async fn load_policy(&self) -> ClientResult<PolicySnapshot> {
        (**self).load_policy().await
    }

    async fn save_policy(&self, body: &PolicyDocument) -> ClientResult<PolicySnapshot> {
        (**self).save_policy(body).await
    }
}

#[async_trait]
impl<T: HintSource + ?Sized> HintSource for Arc<T> {
    async fn fetch_hint(&self, metric: &str, context: &Value) -> ClientResult<String> {
        (**self).fetch_hint(metric, context).await
    }
}
