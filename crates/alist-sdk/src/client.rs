//! Thin typed wrapper over the AList HTTP API.
//!
//! [`AListClient`] performs exactly one HTTP exchange per call and maps
//! each failure onto the [`SdkError`] variant its caller needs: login
//! failures are always [`SdkError::Auth`], metadata failures split into
//! [`SdkError::Network`] and [`SdkError::Api`], and raw content failures
//! are [`SdkError::Preview`].

use std::time::Duration;

use alist_models::{ApiResponse, FsGetRequest, FsObject, LoginData, LoginRequest};
use reqwest::header::AUTHORIZATION;
use tracing::debug;

use crate::error::SdkError;
use crate::routes::ApiRoutes;

/// Settings for the shared HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for one request, connect included.
    pub request_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("alist-preview/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Build a `reqwest` client from this configuration.
    pub fn build(&self) -> Result<reqwest::Client, SdkError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| SdkError::Config(format!("cannot build HTTP client: {e}")))
    }
}

/// Text content read up to a byte cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent {
    /// Decoded body, or its prefix when `truncated`.
    pub text: String,
    /// The body was longer than the cap.
    pub truncated: bool,
    /// Full body length as announced by the server, if it did.
    pub total_bytes: Option<u64>,
}

fn decode_prefix(mut bytes: Vec<u8>, truncated: bool) -> String {
    if truncated {
        if let Err(e) = std::str::from_utf8(&bytes) {
            // Only an incomplete sequence at the very end.
            if e.error_len().is_none() {
                bytes.truncate(e.valid_up_to());
            }
        }
    }
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Client bound to one AList server.
#[derive(Debug, Clone)]
pub struct AListClient {
    http: reqwest::Client,
    base_url: String,
}

impl AListClient {
    /// Wrap an existing `reqwest` client.
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Server base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// `POST /api/auth/login`: exchange username and password for a token.
    ///
    /// Both the transport status and the embedded code must signal
    /// success; every failure is reported as [`SdkError::Auth`].
    pub async fn login(&self, username: &str, password: &str) -> Result<String, SdkError> {
        let res = self
            .http
            .post(ApiRoutes::login(&self.base_url))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(|e| SdkError::Auth(format!("cannot reach server: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(SdkError::Auth(format!("HTTP {status}")));
        }

        let body: ApiResponse<LoginData> = res
            .json()
            .await
            .map_err(|e| SdkError::Auth(format!("invalid login response: {e}")))?;

        if !body.is_success() {
            let reason = if body.message.is_empty() {
                "login failed".to_string()
            } else {
                body.message
            };
            return Err(SdkError::Auth(reason));
        }

        let token = body
            .into_data()
            .map_err(|e| SdkError::Auth(e.to_string()))?
            .token;
        if token.is_empty() {
            return Err(SdkError::Auth("server returned an empty token".into()));
        }
        Ok(token)
    }

    /// `GET /api/me`: check a token out of band.
    pub async fn me(&self, token: &str) -> Result<(), SdkError> {
        let res = self
            .http
            .get(ApiRoutes::me(&self.base_url))
            .header(AUTHORIZATION, token)
            .send()
            .await
            .map_err(|e| SdkError::Network(e.to_string()))?;

        let body: ApiResponse<serde_json::Value> = Self::checked_json(res).await?;
        Self::ensure_success(&body)
    }

    // ------------------------------------------------------------------
    // File system
    // ------------------------------------------------------------------

    /// `POST /api/fs/get`: metadata for one absolute path.
    pub async fn fs_get(&self, token: &str, path: &str) -> Result<FsObject, SdkError> {
        debug!(path = %path, "fs/get");
        let res = self
            .http
            .post(ApiRoutes::fs_get(&self.base_url))
            .header(AUTHORIZATION, token)
            .json(&FsGetRequest::new(path))
            .send()
            .await
            .map_err(|e| SdkError::Network(e.to_string()))?;

        let body: ApiResponse<FsObject> = Self::checked_json(res).await?;
        Self::ensure_success(&body)?;
        Ok(body.into_data()?)
    }

    /// `GET {url}`: raw content of an already-resolved file, as text.
    ///
    /// At most `max_bytes` of the body are read; the rest is never
    /// downloaded. Invalid UTF-8 is replaced, and a character split by the
    /// cap is dropped.
    pub async fn fetch_text(&self, url: &str, max_bytes: usize) -> Result<TextContent, SdkError> {
        let mut res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SdkError::Preview(format!("cannot fetch content: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(SdkError::Preview(format!("HTTP {status}")));
        }

        let total_bytes = res.content_length();
        let mut buf = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = res
            .chunk()
            .await
            .map_err(|e| SdkError::Preview(format!("cannot read content: {e}")))?
        {
            let room = max_bytes - buf.len();
            if chunk.len() > room {
                buf.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            buf.extend_from_slice(&chunk);
        }
        debug!(url = %url, read = buf.len(), truncated, "fetched text");

        Ok(TextContent {
            text: decode_prefix(buf, truncated),
            truncated,
            total_bytes,
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn checked_json<T: serde::de::DeserializeOwned>(
        res: reqwest::Response,
    ) -> Result<ApiResponse<T>, SdkError> {
        let status = res.status();
        if !status.is_success() {
            return Err(SdkError::Network(format!("HTTP {status}")));
        }
        let bytes = res
            .bytes()
            .await
            .map_err(|e| SdkError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SdkError::Network(format!("invalid response body: {e}")))
    }

    fn ensure_success<T>(body: &ApiResponse<T>) -> Result<(), SdkError> {
        if body.is_success() {
            Ok(())
        } else {
            Err(SdkError::Api {
                code: body.code,
                message: body.message.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = AListClient::new(reqwest::Client::new(), " http://localhost:5244/ ");
        assert_eq!(client.base_url(), "http://localhost:5244");
    }

    #[test]
    fn cut_character_is_dropped_from_a_truncated_prefix() {
        let bytes = "héllo".as_bytes()[..2].to_vec();
        assert_eq!(decode_prefix(bytes, true), "h");
        assert_eq!(decode_prefix("hé".as_bytes().to_vec(), true), "hé");
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        assert_eq!(decode_prefix(vec![b'a', 0xff, b'b'], false), "a\u{fffd}b");
    }

    #[test]
    fn default_config_builds() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("alist-preview/"));
        assert!(config.build().is_ok());
    }
}
