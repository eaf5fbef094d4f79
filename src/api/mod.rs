//! Clients for the external prediction services.
//!
//! Two independent services are consumed: the device-risk service and the
//! recall-risk service. Each exposes a metadata endpoint and a prediction
//! endpoint; the web layer talks to them through [`PredictionService`].

mod client;
mod models;

pub use client::*;
pub use models::*;

use crate::form::FormRecord;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to a prediction service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("{}", describe_http_failure(.status, .body))]
    Http { status: u16, body: String },
    #[error("invalid response: {0}")]
    Parse(String),
    #[error("{0}")]
    Service(String),
}

/// Render a non-success response as `HTTP <status>` plus the body detail.
///
/// The detail is the JSON `error` field when the body carries one, else the
/// trimmed body text.
fn describe_http_failure(status: &u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {}", status);
    }

    let detail = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| trimmed.to_string());

    format!("HTTP {} - {}", status, detail)
}

/// A prediction backend for one kind of form record.
#[async_trait]
pub trait PredictionService<R: FormRecord>: Send + Sync {
    /// Fetch the option lists used to populate the form.
    async fn metadata(&self) -> Result<MetadataResponse, ApiError>;

    /// Submit a validated record. One attempt, no retries.
    async fn predict(&self, record: &R) -> Result<R::Prediction, ApiError>;
}
