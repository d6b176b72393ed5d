//! Path → file descriptor resolution.

use std::sync::Arc;

use alist_models::RemoteFileDescriptor;
use tracing::{info, warn};

use crate::client::TextContent;
use crate::error::SdkError;
use crate::session::SessionManager;

/// Turns validated remote paths into [`RemoteFileDescriptor`]s.
///
/// Each call obtains a token from the [`SessionManager`] and issues one
/// metadata request. Nothing is cached between calls.
#[derive(Clone)]
pub struct RemoteFileResolver {
    session: Arc<SessionManager>,
}

impl RemoteFileResolver {
    /// Resolve through `session`.
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// The session this resolver authenticates with.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Fetch metadata for an absolute remote path.
    ///
    /// * [`SdkError::Auth`]: no valid token and login failed.
    /// * [`SdkError::Network`]: transport failure, non-success HTTP status or
    ///   a body that is not a JSON envelope.
    /// * [`SdkError::Api`]: the backend answered with a failure code.
    ///
    /// If the backend reports the token as revoked, the session is
    /// refreshed once and the request retried; the second answer is final.
    pub async fn resolve(&self, path: &str) -> Result<RemoteFileDescriptor, SdkError> {
        let token = self.session.ensure_valid_token().await?;
        let client = self.session.client()?;

        let object = match client.fs_get(&token, path).await {
            Err(e) if e.is_token_rejected() => {
                warn!(path = %path, "token rejected by server, refreshing once");
                self.session.invalidate(&token).await?;
                let token = self.session.ensure_valid_token().await?;
                client.fs_get(&token, path).await?
            }
            other => other?,
        };

        let descriptor = RemoteFileDescriptor::from_fs_object(path, object, client.base_url());
        info!(
            path = %descriptor.path,
            size = descriptor.size,
            is_dir = descriptor.is_directory,
            "resolved"
        );
        Ok(descriptor)
    }

    /// Fetch up to `max_bytes` of a resolved file's raw content as text.
    ///
    /// Failures are reported as [`SdkError::Preview`].
    pub async fn fetch_text(&self, url: &str, max_bytes: usize) -> Result<TextContent, SdkError> {
        let client = self
            .session
            .client()
            .map_err(|e| SdkError::Preview(e.to_string()))?;
        client.fetch_text(url, max_bytes).await
    }
}
