//! Main application orchestration.
//!
//! `watch` wires the session monitor, plan monitor, hint watcher and the
//! optional metrics server together. The one-shot commands go straight to
//! the client.

use copilot_client::CopilotClient;
use copilot_core::{
    parse_pinned, PlanRow, PolicySnapshot, PollConcern, RevisionHint, Session, TimeFilter,
    TimeFilterKind, UniverseConfig,
};
use copilot_sync::{
    FileHintStore, PlanMonitor, PlanMonitorConfig, PolicyEditor, PollerConfig, RevisionHintStore,
    SessionMonitor,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::server::{run_server, ServerState};

/// Main application.
pub struct Application {
    config: AppConfig,
    client: CopilotClient,
    hints: Arc<FileHintStore>,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let client = CopilotClient::new(&config.client_config())?;
        let hints = Arc::new(FileHintStore::open(&config.data_dir)?);

        Ok(Self {
            config,
            client,
            hints,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &CopilotClient {
        &self.client
    }

    fn hint_store(&self) -> Arc<dyn RevisionHintStore> {
        self.hints.clone()
    }

    /// Poll until Ctrl-C.
    pub async fn run_watch(&self) -> AppResult<()> {
        let root = CancellationToken::new();
        let backend = self.client.backend();

        let watcher = self
            .hints
            .spawn_watcher(self.config.hint_watch_interval(), root.clone());

        let session_config =
            PollerConfig::new(PollConcern::Session).with_cadence(self.config.cadence.session);
        let sessions = SessionMonitor::spawn(backend.clone(), self.hint_store(), session_config, &root);

        let mut plan_config = PlanMonitorConfig::new(self.config.plan_top);
        plan_config.poller = plan_config.poller.with_cadence(self.config.cadence.plan);
        plan_config.min_gap = self.config.plan_min_gap();
        let plans = PlanMonitor::spawn(
            backend,
            self.hints.as_ref(),
            sessions.subscribe_mode(),
            plan_config,
            &root,
        );

        let server = if self.config.server.enabled {
            let state = ServerState::new(sessions.subscribe_session(), plans.subscribe(), self.hint_store());
            let port = self.config.server.port;
            let cancel = root.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = run_server(state, port, cancel).await {
                    error!(error = %e, "Metrics server failed");
                }
            }))
        } else {
            None
        };

        info!(
            base_url = %self.client.api().base_url(),
            data_dir = %self.config.data_dir.display(),
            "Watching session and plan"
        );

        let mut mode_rx = sessions.subscribe_mode();
        let mut plan_rx = plans.subscribe();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
                changed = mode_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let mode = *mode_rx.borrow_and_update();
                    if let Some(session) = sessions.session() {
                        info!(
                            ?mode,
                            rev = session.rev,
                            ticker = session.ticker,
                            stale_count = session.stale_count,
                            "Session mode"
                        );
                    }
                }
                changed = plan_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = plan_rx.borrow_and_update().clone();
                    if let Some(snapshot) = snapshot {
                        let top: Vec<&str> = snapshot.rows.iter().take(3).filter_map(PlanRow::symbol).collect();
                        info!(rows = snapshot.rows.len(), ?top, "Plan refreshed");
                    }
                }
            }
        }

        root.cancel();
        plans.shutdown().await;
        sessions.shutdown().await;
        let _ = watcher.await;
        if let Some(server) = server {
            let _ = server.await;
        }

        info!("Shut down");
        Ok(())
    }

    pub async fn session(&self) -> AppResult<Session> {
        Ok(self.client.fetch_session().await?)
    }

    pub async fn plan(&self, top: Option<u32>) -> AppResult<Vec<PlanRow>> {
        let top = top.unwrap_or(self.config.plan_top);
        Ok(self.client.fetch_plan_rows_top(top).await?)
    }

    pub async fn policy_show(&self) -> AppResult<PolicySnapshot> {
        Ok(self.client.load_policy().await?)
    }

    fn editor(&self) -> PolicyEditor<copilot_client::VersionedBackend> {
        PolicyEditor::new(self.client.backend(), self.hint_store())
    }

    /// Set `dotted` to the JSON in `raw_value` and save.
    pub async fn policy_set(&self, dotted: &str, raw_value: &str) -> AppResult<PolicySnapshot> {
        let value: serde_json::Value = serde_json::from_str(raw_value)?;
        let mut editor = self.editor();
        editor.load().await?;
        editor.update(dotted, value)?;
        if !editor.is_dirty() {
            warn!(path = dotted, "Value unchanged, saving anyway");
        }
        Ok(editor.save().await?.clone())
    }

    pub async fn policy_thresholds(&self, text: &str) -> AppResult<PolicySnapshot> {
        let mut editor = self.editor();
        editor.load().await?;
        editor.set_thresholds_json(text)?;
        Ok(editor.save().await?.clone())
    }

    pub async fn policy_time_filter(
        &self,
        kind: TimeFilterKind,
        start: Option<&str>,
        end: Option<&str>,
    ) -> AppResult<PolicySnapshot> {
        let filter = TimeFilter::of_kind(kind, start, end)?;
        Ok(self.editor().save_default_time_filter(&filter).await?)
    }

    pub async fn config_show(&self) -> AppResult<UniverseConfig> {
        Ok(self.client.get_config().await?)
    }

    /// Update whichever fields are given, keeping the rest.
    pub async fn config_set(&self, pinned: Option<&str>, limit: Option<u32>) -> AppResult<UniverseConfig> {
        if pinned.is_none() && limit.is_none() {
            return Err(AppError::Config("config set needs --pinned and/or --limit".to_string()));
        }

        let mut config = self.client.get_config().await?;
        if let Some(text) = pinned {
            config.pinned = parse_pinned(text);
        }
        if let Some(limit) = limit {
            config.universe_limit = limit;
        }
        Ok(self.client.set_config(&config).await?)
    }

    pub fn hint_rev(&self) -> Option<RevisionHint> {
        self.hints.get()
    }
}
