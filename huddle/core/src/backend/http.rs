//! HTTP Backend Implementation
//!
//! Client for the advisory team's REST service. Bodies are read as text and
//! run through [`decode_body`], since upstream models sometimes wrap their
//! JSON in markdown fences.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::traits::{AdvisorBackend, BackendConfig, BackendError};
use crate::response::decode_body;

/// Longest error body kept in [`BackendError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// Health checks never wait longer than this
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP advisory backend client
#[derive(Clone, Debug)]
pub struct HttpAdvisorBackend {
    /// Base URL without trailing slash
    base_url: String,
    /// Whole-request timeout
    timeout: Duration,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpAdvisorBackend {
    /// Create a client from configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
            http_client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn map_error(&self, error: &reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Network(error.to_string())
        }
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Value, BackendError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_error(&e))?;

        if !status.is_success() {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_body(&body)?)
    }
}

#[async_trait]
impl AdvisorBackend for HttpAdvisorBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn health_check(&self) -> bool {
        let response = match self
            .http_client
            .get(self.url("health"))
            .timeout(HEALTH_TIMEOUT.min(self.timeout))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!(status = %response.status(), "Health check failed");
                return false;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Health check failed");
                return false;
            }
        };

        match response.json::<Value>().await {
            Ok(body) => body
                .get("status")
                .and_then(Value::as_str)
                .map_or(true, |status| status == "healthy"),
            Err(_) => true,
        }
    }

    async fn chat(&self, message: &str) -> Result<Value, BackendError> {
        tracing::debug!(url = %self.url("chat"), chars = message.len(), "Sending chat request");
        let response = self
            .http_client
            .post(self.url("chat"))
            .json(&json!({ "message": message }))
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        self.read_body(response).await
    }

    async fn welcome(&self) -> Result<Value, BackendError> {
        let response = self
            .http_client
            .get(self.url("welcome"))
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        self.read_body(response).await
    }
}
