//! Error types raised by store backends.

use thiserror::Error;

/// Errors surfaced by durable-store implementations.
///
/// Store failures are never retried or swallowed below the service layer;
/// they propagate unchanged so callers can decide what a failed write means.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupted data: {0}")]
    Corrupted(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
