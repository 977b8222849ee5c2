//! Inbound request envelopes.
//!
//! A client wraps its query as `{"timestamp": <epoch secs>, "data": <ciphertext>}`.
//! [`EnvelopeVerifier::verify`] checks freshness first and only then
//! decrypts, so a stale envelope never reaches the decryptor.

use std::sync::Arc;

use aes_gcm::{
    Aes256Gcm,
    aead::{Aead, KeyInit, generic_array::GenericArray},
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::error::{Error, RejectReason};

/// Default freshness window in seconds.
pub const FRESHNESS_WINDOW_SECS: u64 = 60;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Raw inbound envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Envelope {
    /// Seconds since the Unix epoch, as a number or numeric string.
    #[serde(default)]
    pub timestamp: Option<Value>,

    /// Base64 ciphertext of the JSON query.
    #[serde(default)]
    pub data: Option<String>,
}

impl Envelope {
    pub fn new(timestamp: i64, data: impl Into<String>) -> Self {
        Self { timestamp: Some(Value::from(timestamp)), data: Some(data.into()) }
    }

    /// The timestamp as epoch seconds, if present and integral.
    pub fn timestamp_secs(&self) -> Option<i64> {
        match self.timestamp.as_ref()? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Decryption failure.
#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("ciphertext is not valid base64")]
    Encoding,

    #[error("ciphertext too short")]
    Truncated,

    #[error("authentication failed")]
    Authentication,

    #[error("plaintext is not UTF-8")]
    Utf8,

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Decryption service for envelope payloads.
#[async_trait]
pub trait Decryptor: Send + Sync {
    async fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptError>;
}

/// AES-256-GCM decryptor.
///
/// Ciphertext is standard base64 of `nonce(12) || ciphertext || tag(16)`.
pub struct AesGcmDecryptor {
    cipher: Aes256Gcm,
}

impl AesGcmDecryptor {
    pub fn new(key: &[u8]) -> Result<Self, DecryptError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| DecryptError::InvalidKey(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Build from a base64-encoded 32-byte key.
    pub fn from_base64(key: &str) -> Result<Self, DecryptError> {
        let bytes = STANDARD
            .decode(key.trim())
            .map_err(|e| DecryptError::InvalidKey(e.to_string()))?;
        Self::new(&bytes)
    }
}

#[async_trait]
impl Decryptor for AesGcmDecryptor {
    async fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptError> {
        let raw = STANDARD.decode(ciphertext.trim()).map_err(|_| DecryptError::Encoding)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(DecryptError::Truncated);
        }

        let (nonce, body) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(GenericArray::from_slice(nonce), body)
            .map_err(|_| DecryptError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| DecryptError::Utf8)
    }
}

/// Decrypted query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainRequest(Map<String, Value>);

impl PlainRequest {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// A string field; numbers are rendered as their decimal form.
    pub fn string(&self, field: &str) -> Result<String, Error> {
        match self.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(Error::rejected(RejectReason::InvalidParam(format!("{field} must be a string")))),
            None => Err(Error::rejected(RejectReason::MissingField(field.to_string()))),
        }
    }

    /// A non-negative integer field, given as a number or numeric string.
    pub fn integer(&self, field: &str) -> Result<u32, Error> {
        let invalid = || Error::rejected(RejectReason::InvalidParam(format!("{field} must be an integer")));
        match self.get(field) {
            Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()).ok_or_else(invalid),
            Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
            Some(_) => Err(invalid()),
            None => Err(Error::rejected(RejectReason::MissingField(field.to_string()))),
        }
    }
}

/// Freshness check plus decryption.
pub struct EnvelopeVerifier {
    decryptor: Arc<dyn Decryptor>,
    clock: Arc<dyn Clock>,
    window_secs: u64,
}

impl EnvelopeVerifier {
    pub fn new(decryptor: Arc<dyn Decryptor>, clock: Arc<dyn Clock>) -> Self {
        Self::with_window(decryptor, clock, FRESHNESS_WINDOW_SECS)
    }

    pub fn with_window(decryptor: Arc<dyn Decryptor>, clock: Arc<dyn Clock>, window_secs: u64) -> Self {
        Self { decryptor, clock, window_secs }
    }

    /// Verify an envelope and return its decrypted query.
    ///
    /// Succeeds only when `0 <= now - timestamp <= window`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` with reason `timestamp`, `expired`, `decrypt` or
    /// `json`, checked in that order.
    pub async fn verify(&self, envelope: &Envelope) -> Result<PlainRequest, Error> {
        let Some(timestamp) = envelope.timestamp_secs() else {
            tracing::debug!(timestamp = ?envelope.timestamp, "rejecting envelope: bad timestamp");
            return Err(Error::rejected(RejectReason::Timestamp));
        };

        let age = self.clock.unix_seconds().saturating_sub(timestamp);
        let window = i64::try_from(self.window_secs).unwrap_or(i64::MAX);
        if !(0..=window).contains(&age) {
            tracing::debug!(age, window, "rejecting envelope: outside freshness window");
            return Err(Error::rejected(RejectReason::Expired));
        }

        let ciphertext = envelope.data.as_deref().unwrap_or_default();
        let plaintext = self.decryptor.decrypt(ciphertext).await.map_err(|e| {
            tracing::debug!(error = %e, "rejecting envelope: decrypt failed");
            Error::rejected(RejectReason::Decrypt)
        })?;

        match serde_json::from_str::<Value>(&plaintext) {
            Ok(Value::Object(fields)) => Ok(PlainRequest::new(fields)),
            _ => Err(Error::rejected(RejectReason::Json)),
        }
    }
}
