//! Primary/secondary fallback composition.
//!
//! `Fallback` tries the primary backend first and, on any failure, the
//! secondary. It implements every capability trait that both halves
//! implement, so the version preference lives in exactly one place.

use async_trait::async_trait;
use copilot_core::{PlanRow, PolicyDocument, PolicySnapshot, Session};
use copilot_telemetry::Metrics;
use std::future::Future;
use std::time::Instant;
use tracing::{error, warn};

use crate::error::ClientResult;
use crate::source::{PlanSource, PolicySource, SessionSource};

/// Two backends in preference order.
#[derive(Debug, Clone)]
pub struct Fallback<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> Fallback<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }
}

async fn timed<T, F>(capability: &str, version: &str, fut: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    Metrics::request_latency(capability, version, start.elapsed().as_secs_f64() * 1000.0);
    result
}

/// Await `primary`; if it fails, build and await the secondary request.
///
/// The secondary is only constructed after the primary has failed. When both
/// fail the secondary's error is returned.
async fn try_else<T, Fp, Fs, G>(capability: &str, primary: Fp, secondary: G) -> ClientResult<T>
where
    Fp: Future<Output = ClientResult<T>>,
    Fs: Future<Output = ClientResult<T>>,
    G: FnOnce() -> Fs,
{
    let primary_err = match timed(capability, "primary", primary).await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    warn!(capability, error = %primary_err, "Primary backend failed, falling back");
    match timed(capability, "secondary", secondary()).await {
        Ok(value) => {
            Metrics::fallback(capability);
            Ok(value)
        }
        Err(e) => {
            error!(capability, primary = %primary_err, secondary = %e, "All backends failed");
            Metrics::fetch_failed(capability);
            Err(e)
        }
    }
}

#[async_trait]
impl<P, S> SessionSource for Fallback<P, S>
where
    P: SessionSource,
    S: SessionSource,
{
    async fn fetch_session(&self) -> ClientResult<Session> {
        try_else("session", self.primary.fetch_session(), || {
            self.secondary.fetch_session()
        })
        .await
    }
}

#[async_trait]
impl<P, S> PlanSource for Fallback<P, S>
where
    P: PlanSource,
    S: PlanSource,
{
    async fn fetch_plan_rows(&self, top: u32) -> ClientResult<Vec<PlanRow>> {
        try_else("plan", self.primary.fetch_plan_rows(top), || {
            self.secondary.fetch_plan_rows(top)
        })
        .await
    }
}

#[async_trait]
impl<P, S> PolicySource for Fallback<P, S>
where
    P: PolicySource,
    S: PolicySource,
{
    async fn load_policy(&self) -> ClientResult<PolicySnapshot> {
        try_else("policy_load", self.primary.load_policy(), || {
            self.secondary.load_policy()
        })
        .await
    }

    async fn save_policy(&self, body: &PolicyDocument) -> ClientResult<PolicySnapshot> {
        try_else("policy_save", self.primary.save_policy(body), || {
            self.secondary.save_policy(body)
        })
        .await
    }
}
