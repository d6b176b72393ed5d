//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK. Its variants follow the preview pipeline's
//! failure taxonomy, so callers can decide how to surface a failure from
//! the variant alone:
//!
//! | Variant | Surfaced as |
//! |---------|-------------|
//! | [`Auth`](SdkError::Auth), [`Validation`](SdkError::Validation) | short error notice, request aborted |
//! | [`Network`](SdkError::Network), [`Api`](SdkError::Api) | error notice, request aborted |
//! | [`Preview`](SdkError::Preview) | fallback inside the preview surface |

use alist_models::{ModelError, TOKEN_INVALID_CODE};

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Missing or rejected credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The request never produced a successful HTTP answer.
    #[error("network error: {0}")]
    Network(String),

    /// HTTP succeeded but the embedded status code signals failure.
    #[error("API error {code}: {message}")]
    Api {
        /// Embedded application status code.
        code: i64,
        /// Backend message, possibly empty.
        message: String,
    },

    /// A link did not carry a usable path.
    #[error("invalid link: {0}")]
    Validation(String),

    /// Content for an already-resolved file could not be fetched.
    #[error("preview failed: {0}")]
    Preview(String),

    /// Invalid or missing configuration (e.g. unreadable settings file).
    #[error("configuration error: {0}")]
    Config(String),

    /// Token store I/O failure.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SdkError {
    /// `true` when the backend reported the presented token as invalid.
    pub fn is_token_rejected(&self) -> bool {
        matches!(self, Self::Api { code, .. } if *code == TOKEN_INVALID_CODE)
    }

    /// Short text suitable for a transient user notice.
    pub fn notice_text(&self) -> String {
        match self {
            Self::Auth(reason) => format!("Login failed: {reason}"),
            Self::Network(reason) => format!("Cannot reach AList server: {reason}"),
            Self::Api { message, .. } if !message.is_empty() => format!("AList error: {message}"),
            Self::Api { code, .. } => format!("AList error (code {code})"),
            Self::Validation(reason) => format!("Invalid AList link: {reason}"),
            Self::Preview(reason) => format!("Preview unavailable: {reason}"),
            Self::Config(reason) => format!("Configuration error: {reason}"),
            Self::Storage(e) => format!("Cannot store session: {e}"),
            Self::Serialization(e) => format!("Unexpected server answer: {e}"),
        }
    }
}

impl From<ModelError> for SdkError {
    fn from(e: ModelError) -> Self {
        match &e {
            ModelError::InvalidLinkPath { reason, .. } => SdkError::Validation(reason.clone()),
            ModelError::MissingField { .. } => SdkError::Api {
                code: alist_models::SUCCESS_CODE,
                message: e.to_string(),
            },
        }
    }
}
