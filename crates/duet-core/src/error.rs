//! Error types for Duet.

use thiserror::Error;

/// Result type alias using Duet's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Duet.
#[derive(Error, Debug)]
pub enum Error {
    // Playback errors
    #[error("Failed to load {source_ref}: {reason}")]
    Load { source_ref: String, reason: String },

    #[error("Remote playback is unavailable while offline")]
    Offline,

    #[error("Backend error: {0}")]
    Backend(String),

    // Collaborator errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Quota exceeded for API key ending in {key_hint}")]
    QuotaExceeded { key_hint: String },

    #[error("Search provider error: {0}")]
    Search(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Build a load error for the given source reference.
    pub fn load(source_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            source_ref: source_ref.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a quota error.
    pub const fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}
