//! What the proxy hands back to its caller.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use vodgate_core::Error;
use vodgate_core::cache::annotate_cached;

/// How a request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Fetched from upstream on this request.
    Fresh,
    /// Served from the response cache.
    Cached,
    /// Upstream reported zero results.
    NoResult,
    /// Rejected before any upstream call.
    Rejected,
    /// Upstream or store failure.
    Failed,
}

/// Status plus JSON body, ready for the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: Value,
    pub outcome: Outcome,
}

impl ProxyResponse {
    pub fn fresh(body: Value) -> Self {
        Self { status: 200, body, outcome: Outcome::Fresh }
    }

    /// A cache-derived payload, tagged with the `cached` marker.
    pub fn cached(body: Value) -> Self {
        Self { status: 200, body: annotate_cached(body), outcome: Outcome::Cached }
    }

    /// 200 with an empty object.
    pub fn no_result() -> Self {
        Self { status: 200, body: json!({}), outcome: Outcome::NoResult }
    }

    /// `{"error": ...}` with the status the error maps to.
    pub fn from_error(err: &Error) -> Self {
        let status = err.status_code();
        let outcome = if status < 500 { Outcome::Rejected } else { Outcome::Failed };
        Self { status, body: json!({ "error": err.client_message() }), outcome }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<Result<ProxyResponse, Error>> for ProxyResponse {
    fn from(result: Result<ProxyResponse, Error>) -> Self {
        match result {
            Ok(response) => response,
            Err(e) => {
                if e.status_code() >= 500 {
                    tracing::error!(error = %e, "request failed");
                } else {
                    tracing::info!(error = %e, "request rejected");
                }
                ProxyResponse::from_error(&e)
            }
        }
    }
}
