//! Error types for the council engine

use thiserror::Error;

/// Result type alias for council operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for council operations
///
/// Problems with an individual finding never show up here; they are
/// recorded as verification notes on that finding instead.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Synthesis was invoked without a single successful reviewer output
    #[error("No successful reviewer outputs to synthesize")]
    NoReviewers,
}
