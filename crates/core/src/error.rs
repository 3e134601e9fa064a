//! Centralized error types for the Warden workspace.

use thiserror::Error;

/// Top-level error enum. Variants map to the ways a resource or an
/// operation built on a scoped block can fail.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WardenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value is missing or cannot be interpreted.
    ///
    /// Both the lookup failure and the parse failure land here so callers
    /// handle one variant.
    #[error("Configuration error for `{key}`: {reason}")]
    Config {
        key: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Resource already released: {0}")]
    AlreadyReleased(String),

    /// Raised on purpose by scripted resources.
    #[error("{0}")]
    Scripted(String),
}

pub type WardenResult<T> = Result<T, WardenError>;
