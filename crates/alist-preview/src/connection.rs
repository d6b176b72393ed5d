//! "Test connection" flow for a settings screen.

use alist_models::TokenRecord;
use alist_sdk::{SdkError, SessionManager};
use tracing::{info, warn};

use crate::notice::{Notice, Notifier, RESULT, TRANSIENT};

/// Log in with the currently configured credentials and report the result
/// through `notifier`.
///
/// Incomplete credentials are reported without any network call. On
/// success the fresh token is persisted, exactly like a regular refresh.
pub async fn test_connection(
    session: &SessionManager,
    notifier: &dyn Notifier,
) -> Result<TokenRecord, SdkError> {
    let credentials = match session.credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            notifier.notify(Notice::error(e.notice_text()));
            return Err(e);
        }
    };
    if !credentials.is_complete() {
        notifier.notify(Notice::error(
            "Please configure the server URL, username and password first",
        ));
        return Err(SdkError::Auth(
            "server URL, username and password must be configured".into(),
        ));
    }

    notifier.notify(Notice::info("Testing connection…", TRANSIENT));
    match session.login(&credentials).await {
        Ok(record) => {
            info!(server = %credentials.base_url(), "connection test passed");
            notifier.notify(Notice::info("Connection successful", RESULT));
            Ok(record)
        }
        Err(e) => {
            warn!(server = %credentials.base_url(), error = %e, "connection test failed");
            let reason = match &e {
                SdkError::Auth(reason) => reason.clone(),
                other => other.to_string(),
            };
            notifier.notify(Notice::error(format!("Connection failed: {reason}")));
            Err(e)
        }
    }
}
