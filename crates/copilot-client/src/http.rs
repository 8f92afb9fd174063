//! Thin JSON-over-HTTP client for the backend REST API.

use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    /// * `base_url` - Backend origin (e.g., "http://localhost:8000")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> ClientResult<Value> {
        debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| ClientError::HttpClient(format!("GET {path} failed: {e}")))?;

        Self::decode(path, Self::check_status(response).await?).await
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B>(&self, path: &str, body: &B) -> ClientResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let response = self.send_post(path, body).await?;
        Self::decode(path, response).await
    }

    /// POST a JSON body, checking only the status. The response body is ignored.
    pub async fn post_ignore_body<B>(&self, path: &str, body: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send_post(path, body).await.map(|_| ())
    }

    async fn send_post<B>(&self, path: &str, body: &B) -> ClientResult<Response>
    where
        B: Serialize + ?Sized,
    {
        debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::HttpClient(format!("POST {path} failed: {e}")))?;

        Self::check_status(response).await
    }

    async fn check_status(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode(path: &str, response: Response) -> ClientResult<Value> {
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("{path}: {e}")))
    }
}
