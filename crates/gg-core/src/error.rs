//! # GossipError
//!
//! Failures the gossip service can report. The HTTP layer maps each variant
//! to a status code; the store's own errors are wrapped as `Persistence`.

use thiserror::Error;
use uuid::Uuid;

/// The primary error type for all gg-core operations.
#[derive(Error, Debug)]
pub enum GossipError {
    /// Missing or malformed submission fields. User-correctable.
    #[error("validation error: {0}")]
    Validation(String),

    /// Delete targeting an id the store does not hold.
    #[error("gossip not found with ID {0}")]
    NotFound(Uuid),

    /// The store failed to read or write.
    #[error("persistence error: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl GossipError {
    pub fn validation(message: impl Into<String>) -> Self {
        GossipError::Validation(message.into())
    }
}

/// A specialized Result type for gossip logic.
pub type Result<T> = std::result::Result<T, GossipError>;
