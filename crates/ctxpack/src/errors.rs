//! # Error Types

/// Errors from ctxpack operations.
#[derive(Debug, thiserror::Error)]
pub enum CtxpackError {
    /// The requested context length cannot produce full chunks.
    #[error("context length ({length}) must be >= 1")]
    InvalidContextLength {
        /// The rejected context length.
        length: usize,
    },

    /// A sample record has no value under the configured text key.
    #[error("sample has no {key:?} field")]
    MissingTextField {
        /// The configured text key.
        key: String,
    },

    /// A sample record's text field is not a string.
    #[error("sample field {key:?} is not a string")]
    TextFieldNotString {
        /// The configured text key.
        key: String,
    },

    /// Token value out of range for the target token type.
    #[error("token {token} out of range for the target token type")]
    TokenOutOfRange {
        /// The token id that did not fit.
        token: u64,
    },

    /// The tokenizer failed on a sample.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// The training plan geometry has a zero factor.
    #[error("invalid train plan: {0}")]
    InvalidPlan(String),

    /// JSON (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error from an external component.
    #[error("{0}")]
    External(String),
}

/// Result type for ctxpack operations.
pub type CPResult<T> = core::result::Result<T, CtxpackError>;
