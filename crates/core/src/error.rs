//! Unified error types for vodgate.
//!
//! Every failure here is scoped to a single request; nothing is fatal to
//! the process.

use std::fmt;

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Why an inbound request was rejected before any upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Timestamp missing or not an integer.
    Timestamp,
    /// Timestamp outside the freshness window.
    Expired,
    /// Ciphertext could not be decrypted.
    Decrypt,
    /// Decrypted plaintext is not a JSON object.
    Json,
    /// A required payload field is absent.
    MissingField(String),
    /// A payload field is present but unusable.
    InvalidParam(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Timestamp => f.write_str("timestamp"),
            RejectReason::Expired => f.write_str("expired"),
            RejectReason::Decrypt => f.write_str("decrypt"),
            RejectReason::Json => f.write_str("json"),
            RejectReason::MissingField(field) => write!(f, "missing field: {field}"),
            RejectReason::InvalidParam(detail) => write!(f, "invalid param: {detail}"),
        }
    }
}

/// Unified error types for the vodgate proxy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Client-fixable request problem.
    #[error("INVALID_REQUEST: {0}")]
    InvalidRequest(RejectReason),

    /// Transport failure or non-2xx from the catalog API.
    #[error("UPSTREAM_ERROR: {0}")]
    Upstream(String),

    /// The key-value store refused a write.
    #[error("CACHE_WRITE_ERROR: {0}")]
    CacheWrite(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Key pattern is empty or otherwise unusable.
    #[error("INVALID_PATTERN: {0}")]
    InvalidPattern(String),
}

impl Error {
    /// Shorthand for an `InvalidRequest` rejection.
    pub fn rejected(reason: RejectReason) -> Self {
        Error::InvalidRequest(reason)
    }

    /// HTTP-style status a caller should surface for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidRequest(_) | Error::InvalidPattern(_) => 400,
            Error::Upstream(_) | Error::CacheWrite(_) => 503,
            Error::Database(_) | Error::MigrationFailed(_) => 500,
        }
    }

    /// Message placed in the `{"error": ...}` body returned to clients.
    pub fn client_message(&self) -> String {
        match self {
            Error::InvalidRequest(reason) => format!("Invalid Request, {reason}"),
            Error::Upstream(_) => "Upstream Error".to_string(),
            Error::CacheWrite(_) => "Service Unavailable".to_string(),
            Error::InvalidPattern(msg) => msg.clone(),
            Error::Database(_) | Error::MigrationFailed(_) => "Internal Error".to_string(),
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidRequest(reason) => (-32602, reason.to_string()),
            Error::InvalidPattern(msg) => (-32602, msg.clone()),
            Error::Upstream(msg) => (-32008, msg.clone()),
            Error::CacheWrite(msg) => (-32002, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
