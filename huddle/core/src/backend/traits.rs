//! Advisory Backend Traits
//!
//! Trait definitions for the advisory backend. Playback only ever sees a
//! decoded JSON body; transport, status handling and body clean-up are the
//! implementation's business.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::response::SchemaError;

/// Why a backend call produced no usable body
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Connection or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// No answer within the request timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status
    #[error("backend returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// A body arrived but could not be used
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl BackendError {
    /// True for transport-level failures (everything but schema problems)
    pub fn is_network(&self) -> bool {
        !matches!(self, Self::Schema(_))
    }
}

/// The advisory team service
///
/// Implementations must be cheap to share across tasks.
#[async_trait]
pub trait AdvisorBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Check that the backend is reachable and healthy
    async fn health_check(&self) -> bool;

    /// Send the user's message and return the decoded response body
    async fn chat(&self, message: &str) -> Result<Value, BackendError>;

    /// Fetch the greeting conversation
    async fn welcome(&self) -> Result<Value, BackendError>;
}

/// Where the backend lives and how long to wait for it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL, without a trailing slash
    pub base_url: String,
    /// Bound on a whole request
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl BackendConfig {
    /// Configuration for a base URL with the default timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
