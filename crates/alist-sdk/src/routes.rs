//! Canonical AList API routes.
//!
//! Every URL the SDK calls is built through [`ApiRoutes`], so the endpoint
//! layout is defined in exactly one place.
//!
//! # Route layout
//!
//! ```text
//! {server}/api/auth/login   ← POST, username + password → token
//! {server}/api/fs/get       ← POST, path → file object   (Authorization: token)
//! {server}/api/me           ← GET, token check           (Authorization: token)
//! {server}/d{path}          ← GET, raw download
//! ```

use alist_models::download_url;

/// Central authority for AList endpoint URLs.
///
/// # Examples
///
/// ```
/// use alist_sdk::ApiRoutes;
///
/// assert_eq!(
///     ApiRoutes::login("http://localhost:5244/"),
///     "http://localhost:5244/api/auth/login",
/// );
/// assert_eq!(
///     ApiRoutes::download("http://localhost:5244", "/test/file.txt"),
///     "http://localhost:5244/d/test/file.txt",
/// );
/// ```
pub struct ApiRoutes;

impl ApiRoutes {
    /// `POST`: exchange username and password for a token.
    pub fn login(base_url: &str) -> String {
        format!("{}/api/auth/login", trim(base_url))
    }

    /// `POST`: metadata for one path.
    pub fn fs_get(base_url: &str) -> String {
        format!("{}/api/fs/get", trim(base_url))
    }

    /// `GET`: current user; used to check a token out of band.
    pub fn me(base_url: &str) -> String {
        format!("{}/api/me", trim(base_url))
    }

    /// `GET`: raw content of `path`, used when the backend omits `raw_url`.
    pub fn download(base_url: &str, path: &str) -> String {
        download_url(base_url, path)
    }
}

fn trim(base_url: &str) -> &str {
    base_url.trim().trim_end_matches('/')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
