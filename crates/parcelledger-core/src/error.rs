//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
///
/// Extraction itself never fails: unparseable dates and unmatched carriers
/// surface as `None` fields, not as errors. These variants only cover the
/// collaborator seams (message source, store, configuration).
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The message source could not list or fetch messages for an account.
    #[error("Message source error: {0}")]
    Source(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
