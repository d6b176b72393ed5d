//! User-supplied login credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server address and account used to log in to an AList backend.
///
/// Credentials are only ever changed through external configuration; the
/// core reads them and never writes them back.
///
/// # Examples
///
/// ```
/// use alist_models::Credentials;
///
/// let creds = Credentials::new("http://localhost:5244", "admin", "secret");
/// assert!(creds.is_complete());
/// assert!(!Credentials::default().is_complete());
/// ```
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Base URL of the AList server, e.g. `http://localhost:5244`.
    pub server_url: String,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl Credentials {
    /// Build credentials from string slices.
    pub fn new(server_url: &str, username: &str, password: &str) -> Self {
        Self {
            server_url: server_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// `true` when every field is non-empty (after trimming whitespace).
    pub fn is_complete(&self) -> bool {
        !self.server_url.trim().is_empty()
            && !self.username.trim().is_empty()
            && !self.password.is_empty()
    }

    /// The server URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.server_url.trim().trim_end_matches('/')
    }
}

// Hand-written so passwords never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_empty_field_is_incomplete() {
        assert!(!Credentials::new("", "admin", "pw").is_complete());
        assert!(!Credentials::new("http://h", "", "pw").is_complete());
        assert!(!Credentials::new("http://h", "admin", "").is_complete());
        assert!(!Credentials::new("   ", "admin", "pw").is_complete());
        assert!(Credentials::new("http://h", "admin", "pw").is_complete());
    }

    #[test]
    fn base_url_strips_trailing_slashes() {
        let creds = Credentials::new("http://localhost:5244//", "a", "b");
        assert_eq!(creds.base_url(), "http://localhost:5244");
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("http://h", "admin", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("admin"));
    }

    #[test]
    fn serializes_camel_case() {
        let creds = Credentials::new("http://h", "admin", "pw");
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["serverUrl"], "http://h");
    }
}
