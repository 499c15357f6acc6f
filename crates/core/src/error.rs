//! Error types for tendero.

use thiserror::Error;

/// Result type alias using tendero's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tendero.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fetched content is not an image (content-type: {content_type})")]
    NotAnImage {
        content_type: String,
        /// Truncated sample of the response body, for diagnostics.
        sample: String,
    },

    #[error("Fetched content is not audio or video (content-type: {content_type})")]
    NotAudio {
        content_type: String,
        /// Truncated sample of the response body, for diagnostics.
        sample: String,
    },

    #[error("Payload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Image decode failed: {0}")]
    ImageDecode(String),

    // =========================================================================
    // Media Pipeline Errors
    // =========================================================================
    #[error("Audio transcode failed: {0}")]
    TranscodeFailed(String),

    // =========================================================================
    // External Service Errors
    // =========================================================================
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Upstream error from {service}: {detail}")]
    Upstream { service: String, detail: String },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a missing input error.
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a missing credential error.
    pub fn missing_credential(msg: impl Into<String>) -> Self {
        Self::MissingCredential(msg.into())
    }

    /// Create an upstream error.
    pub fn upstream(service: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            detail: detail.into(),
        }
    }

    /// Create a transcode error.
    pub fn transcode(msg: impl Into<String>) -> Self {
        Self::TranscodeFailed(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
