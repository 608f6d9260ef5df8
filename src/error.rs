//! Error types for the geocache crate.

use std::error::Error as StdError;
use std::sync::Arc;

/// Result alias for fallible geocache operations.
pub type Result<T> = std::result::Result<T, GeoCacheError>;

/// Failure reported by a [`RemoteCategoryLookup`](crate::RemoteCategoryLookup).
///
/// The cause is opaque to the cache: network, parsing and rate-limit failures
/// all look the same from here. The error is `Clone` so that every caller
/// waiting on a shared in-flight fetch receives the same failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("remote category lookup failed: {message}")]
pub struct LookupError {
    message: String,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl LookupError {
    /// Create a lookup error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a lookup error wrapping an underlying cause.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised outside the remote lookup path: input normalization,
/// configuration and cache assembly.
#[derive(Debug, thiserror::Error)]
pub enum GeoCacheError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid GPS format: {0}")]
    InvalidFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}
