//! Core types and shared functionality for vodgate.
//!
//! This crate provides:
//! - Upstream token derivation and the single-slot token cache
//! - Envelope verification (freshness window + decryption)
//! - SQLite-backed key-value store and day-bucketed response cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod clock;
pub mod config;
pub mod envelope;
pub mod error;
pub mod token;

pub use cache::{CacheDb, CacheEntry, CacheKey, KvStore, Query, ResponseCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use envelope::{AesGcmDecryptor, DecryptError, Decryptor, Envelope, EnvelopeVerifier, PlainRequest};
pub use error::{Error, RejectReason};
pub use token::TokenCache;
