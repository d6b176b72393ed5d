//! Wire DTOs for the AList HTTP API.
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! { "code": 200, "message": "success", "data": { … } }
//! ```
//!
//! A `200 OK` transport status does not imply success; the embedded
//! [`code`](ApiResponse::code) must be checked as well.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Embedded status code signalling application-level success.
pub const SUCCESS_CODE: i64 = 200;

/// Embedded status code the backend uses for a revoked or expired token.
pub const TOKEN_INVALID_CODE: i64 = 401;

/// Response envelope shared by all endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// Application status code; [`SUCCESS_CODE`] on success.
    pub code: i64,
    /// Human-readable status message.
    #[serde(default)]
    pub message: String,
    /// Endpoint-specific payload; absent or `null` on failure.
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Wrap a successful payload.
    pub fn ok(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: "success".into(),
            data: Some(data),
        }
    }

    /// Build a failure envelope without payload.
    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// `true` when [`code`](Self::code) equals [`SUCCESS_CODE`].
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Take the payload, failing if the backend sent none.
    pub fn into_data(self) -> Result<T, ModelError> {
        self.data.ok_or_else(|| ModelError::MissingField {
            field: "data".into(),
        })
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

/// Payload of a successful login.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginData {
    /// Opaque bearer token.
    pub token: String,
}

/// Body of `POST /api/fs/get`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FsGetRequest {
    /// Absolute remote path.
    pub path: String,
    /// Folder password; always empty for previews.
    #[serde(default)]
    pub password: String,
}

impl FsGetRequest {
    /// Request metadata for `path` without a folder password.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            password: String::new(),
        }
    }
}

/// Raw file object returned by `POST /api/fs/get`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FsObject {
    /// File name without directory.
    pub name: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Whether the object is a directory.
    #[serde(default)]
    pub is_dir: bool,
    /// Last modification time as sent by the backend (RFC 3339).
    #[serde(default)]
    pub modified: String,
    /// Direct content URL; may be missing or empty.
    #[serde(default)]
    pub raw_url: Option<String>,
}
