//! Opaque JSON endpoints.
//!
//! These payloads are rendered by display layers and never interpreted here,
//! so they are returned as raw `serde_json::Value`.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::CopilotClient;
use crate::endpoints;
use crate::error::ClientResult;
use crate::source::HintSource;

/// Historical what-if trade parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfQuery {
    pub symbol: String,
    pub date: NaiveDate,
    /// Entry time, `HH:MM`.
    pub time: String,
    pub entry: f64,
    pub stop: f64,
    pub tp2: f64,
    pub risk_amt: f64,
}

impl WhatIfQuery {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", self.symbol.clone()),
            ("date", fmt_date(self.date)),
            ("time", self.time.clone()),
            ("entry", self.entry.to_string()),
            ("stop", self.stop.to_string()),
            ("tp2", self.tp2.to_string()),
            ("risk_amt", self.risk_amt.to_string()),
        ]
    }
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl CopilotClient {
    pub async fn hist_bars(&self, symbol: &str, date: NaiveDate) -> ClientResult<Value> {
        self.api()
            .get_json(
                endpoints::V2_HIST_BARS,
                &[("symbol", symbol.to_string()), ("date", fmt_date(date))],
            )
            .await
    }

    pub async fn hist_analyze(&self, symbol: &str, date: NaiveDate, time: &str) -> ClientResult<Value> {
        self.api()
            .get_json(
                endpoints::V2_HIST_ANALYZE,
                &[
                    ("symbol", symbol.to_string()),
                    ("date", fmt_date(date)),
                    ("time", time.to_string()),
                ],
            )
            .await
    }

    pub async fn hist_whatif(&self, query: &WhatIfQuery) -> ClientResult<Value> {
        self.api()
            .get_json(endpoints::V2_HIST_WHATIF, &query.to_query())
            .await
    }

    pub async fn analyze(&self, symbol: &str) -> ClientResult<Value> {
        self.api()
            .get_json(endpoints::V2_ANALYZE, &[("symbol", symbol.to_string())])
            .await
    }

    pub async fn bars(&self, symbol: &str, limit: u32) -> ClientResult<Value> {
        self.api()
            .get_json(
                endpoints::BARS,
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await
    }

    /// Live quotes for `symbols`, sent comma-joined.
    pub async fn live(&self, symbols: &[String]) -> ClientResult<Value> {
        self.api()
            .get_json(endpoints::LIVE, &[("symbols", symbols.join(","))])
            .await
    }

    pub async fn journal(&self) -> ClientResult<Value> {
        self.api().get_json(endpoints::JOURNAL, &[]).await
    }

    pub async fn add_journal_entry(&self, entry: &Value) -> ClientResult<Value> {
        self.api().post_json(endpoints::JOURNAL, entry).await
    }

    /// Broker login URL, if the backend provides one.
    pub async fn login_url(&self) -> ClientResult<Option<String>> {
        let raw = self.api().get_json(endpoints::KITE_LOGIN_URL, &[]).await?;
        Ok(raw
            .get("login_url")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Short explanation for a metric. Empty when the backend has none.
    pub async fn hint(&self, metric: &str, context: &Value) -> ClientResult<String> {
        let raw = self
            .api()
            .post_json(endpoints::HINT, &json!({ "metric": metric, "context": context }))
            .await?;
        Ok(raw
            .pointer("/data/hint")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Named contextual lookup, `POST /api/contextual/<name>`.
    pub async fn contextual(&self, name: &str, payload: &Value) -> ClientResult<Value> {
        let path = format!("{}/{}", endpoints::CONTEXTUAL_PREFIX, name);
        self.api().post_json(&path, payload).await
    }
}

#[async_trait]
impl HintSource for CopilotClient {
    async fn fetch_hint(&self, metric: &str, context: &Value) -> ClientResult<String> {
        self.hint(metric, context).await
    }
}
