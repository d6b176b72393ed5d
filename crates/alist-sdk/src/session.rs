//! Session and token lifecycle.
//!
//! [`SessionManager`] answers one question for the rest of the pipeline:
//! "give me a token that is valid right now". It reads the persisted
//! [`TokenRecord`], and when that record is missing or about to expire it
//! reloads credentials and logs in again.
//!
//! Refreshes are serialized: callers that find the record invalid queue
//! on a single refresh lock and re-check the store once they hold it, so
//! a burst of concurrent requests produces exactly one login.

use std::sync::Arc;

use alist_models::{Credentials, TokenRecord};
use chrono::{TimeDelta, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::{AListClient, ClientConfig};
use crate::error::SdkError;
use crate::settings::CredentialProvider;
use crate::store::TokenStore;

/// Token lifetime rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Lifetime assumed for a freshly issued token.
    pub session_ttl: TimeDelta,
    /// Safety margin subtracted from the expiry before a token counts as
    /// stale.
    pub refresh_buffer: TimeDelta,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            session_ttl: TimeDelta::hours(24),
            refresh_buffer: TimeDelta::minutes(5),
        }
    }
}

/// Owns credentials lookup and the persisted token.
pub struct SessionManager {
    credentials: Arc<dyn CredentialProvider>,
    store: Arc<dyn TokenStore>,
    http: reqwest::Client,
    policy: SessionPolicy,
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    /// Build a manager with the default HTTP client and policy.
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, SdkError> {
        Ok(Self::with_http(
            credentials,
            store,
            ClientConfig::default().build()?,
        ))
    }

    /// Build a manager around an existing HTTP client.
    pub fn with_http(
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn TokenStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            credentials,
            store,
            http,
            policy: SessionPolicy::default(),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Replace the token lifetime rules.
    #[must_use]
    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active token lifetime rules.
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Current credentials from the provider.
    pub fn credentials(&self) -> Result<Credentials, SdkError> {
        self.credentials.credentials()
    }

    /// API client for the currently configured server.
    pub fn client(&self) -> Result<AListClient, SdkError> {
        let creds = self.credentials()?;
        if creds.base_url().is_empty() {
            return Err(SdkError::Config("server URL is not configured".into()));
        }
        Ok(AListClient::new(self.http.clone(), creds.base_url()))
    }

    /// The persisted record, whether or not it is still valid.
    ///
    /// An unreadable record is logged and treated as absent.
    pub fn current_record(&self) -> Option<TokenRecord> {
        match self.store.load() {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable token record");
                None
            }
        }
    }

    /// The persisted token if it is valid at this instant.
    fn valid_token(&self) -> Option<String> {
        self.current_record()
            .filter(|r| r.is_valid_at(Utc::now(), self.policy.refresh_buffer))
            .map(|r| r.token)
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Log in with `credentials` and persist the resulting record.
    ///
    /// The record expires [`SessionPolicy::session_ttl`] from now. A
    /// failure to persist is logged; the fresh token is still returned.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenRecord, SdkError> {
        if !credentials.is_complete() {
            return Err(SdkError::Auth(
                "server URL, username and password must be configured".into(),
            ));
        }

        let client = AListClient::new(self.http.clone(), credentials.base_url());
        let token = client
            .login(&credentials.username, &credentials.password)
            .await?;

        let record = TokenRecord::issued(token, Utc::now(), self.policy.session_ttl);
        if let Err(e) = self.store.save(&record) {
            warn!(error = %e, "could not persist token record");
        }
        info!(
            server = %credentials.base_url(),
            username = %credentials.username,
            expires_at = %record.expires_at,
            "logged in"
        );
        Ok(record)
    }

    /// Return a currently valid token, logging in again when necessary.
    ///
    /// Fails with [`SdkError::Auth`] without touching the network when a
    /// refresh is needed but the credentials are incomplete.
    pub async fn ensure_valid_token(&self) -> Result<String, SdkError> {
        if let Some(token) = self.valid_token() {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while this one was queued.
        if let Some(token) = self.valid_token() {
            debug!("reusing token refreshed by a concurrent caller");
            return Ok(token);
        }

        debug!("token missing or stale, refreshing");
        let credentials = self.credentials()?;
        let record = self.login(&credentials).await?;
        Ok(record.token)
    }

    /// Check the persisted token against `GET /api/me`.
    ///
    /// Any failure (no record, transport error, rejected token) counts as
    /// "invalid"; this never returns an error.
    pub async fn verify_token(&self) -> bool {
        let Some(record) = self.current_record() else {
            return false;
        };
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                debug!(error = %e, "token check skipped");
                return false;
            }
        };
        match client.me(&record.token).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "token check failed");
                false
            }
        }
    }

    /// Forget `stale_token` so the next [`ensure_valid_token`] refreshes.
    ///
    /// Does nothing if the store already holds a different token, which
    /// means a concurrent caller has refreshed in the meantime.
    ///
    /// [`ensure_valid_token`]: Self::ensure_valid_token
    pub async fn invalidate(&self, stale_token: &str) -> Result<(), SdkError> {
        let _guard = self.refresh_lock.lock().await;
        match self.store.load() {
            Ok(Some(record)) if record.token != stale_token => Ok(()),
            _ => self.store.clear(),
        }
    }

    /// Remove the persisted record (logout / uninstall).
    pub fn clear(&self) -> Result<(), SdkError> {
        self.store.clear()?;
        info!("session cleared");
        Ok(())
    }
}
