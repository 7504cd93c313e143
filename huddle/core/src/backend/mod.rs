//! Advisory Backend Integration
//!
//! The backend is an opaque collaborator: it takes the user's message and
//! returns a batch conversation from the whole advisory team. This module
//! defines the [`AdvisorBackend`] trait the rest of the crate talks to, and an
//! HTTP client for the real service.
//!
//! # Endpoints
//!
//! - `POST /chat` with `{"message": "..."}` returns `{"conversation": [...]}`
//! - `GET /welcome` returns a greeting conversation
//! - `GET /health` returns `{"status": "healthy"}`
//!
//! # Usage
//!
//! ```ignore
//! use huddle_core::backend::{AdvisorBackend, BackendConfig, HttpAdvisorBackend};
//!
//! let backend = HttpAdvisorBackend::from_config(&BackendConfig::default())?;
//! let body = backend.chat("Looking for a 3-bedroom near downtown").await?;
//! ```

mod http;
mod traits;

pub use http::HttpAdvisorBackend;
pub use traits::{AdvisorBackend, BackendConfig, BackendError};
