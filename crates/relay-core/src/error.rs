//! Error types for the relay core.

use thiserror::Error;

/// Errors that can occur in the relay core.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Required environment variable missing.
    #[error("{0} not set")]
    MissingEnv(&'static str),

    /// Environment variable present but unusable.
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidEnv {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: String,
    },

    /// Roster file or roster edit is inconsistent.
    #[error("roster error: {0}")]
    Roster(String),

    /// A display-name variant already belongs to another mention.
    #[error("'{variant}' is already registered for {owner}")]
    DuplicateVariant {
        /// The variant being added.
        variant: String,
        /// Mention that already owns it.
        owner: String,
    },

    /// HTTP client construction or request error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Outbound notification failed.
    #[error("notification failed: {0}")]
    Notify(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for relay core operations.
pub type Result<T> = std::result::Result<T, RelayError>;

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Http(e.to_string())
    }
}
