use std::sync::Arc;
use std::time::Duration;

use alist_models::{Credentials, TokenRecord};
use alist_sdk::{MemoryTokenStore, SdkError, SessionManager, TokenStore};
use chrono::{TimeDelta, Utc};
use mock_alist::{MockAList, MockServer};

async fn server() -> MockServer {
    MockAList::new("admin", "secret").spawn().await.unwrap()
}

fn session_for(
    credentials: Credentials,
    store: Arc<MemoryTokenStore>,
) -> SessionManager {
    SessionManager::new(Arc::new(credentials), store).unwrap()
}

#[tokio::test]
async fn incomplete_credentials_fail_without_network_call() {
    let server = server().await;
    let incomplete = [
        Credentials::new(&server.url(), "", "secret"),
        Credentials::new(&server.url(), "admin", ""),
        Credentials::new("", "admin", "secret"),
    ];

    for credentials in incomplete {
        let session = session_for(credentials, Arc::new(MemoryTokenStore::new()));
        let result = session.ensure_valid_token().await;
        assert!(matches!(result, Err(SdkError::Auth(_))), "{result:?}");
    }
    assert_eq!(server.state.total_calls(), 0);
}

#[tokio::test]
async fn login_persists_record_expiring_in_a_day() {
    let server = server().await;
    let store = Arc::new(MemoryTokenStore::new());
    let session = session_for(Credentials::new(&server.url(), "admin", "secret"), Arc::clone(&store));

    let before = Utc::now();
    let record = session
        .login(&Credentials::new(&server.url(), "admin", "secret"))
        .await
        .unwrap();

    assert!(!record.token.is_empty());
    let ttl = record.expires_at - before;
    assert!(ttl >= TimeDelta::hours(24) && ttl < TimeDelta::hours(24) + TimeDelta::minutes(1));
    assert_eq!(store.load().unwrap(), Some(record));
}

#[tokio::test]
async fn rejected_login_surfaces_backend_message() {
    let server = server().await;
    let store = Arc::new(MemoryTokenStore::new());
    let session = session_for(Credentials::default(), Arc::clone(&store));

    let err = session
        .login(&Credentials::new(&server.url(), "admin", "wrong"))
        .await
        .unwrap_err();

    match err {
        SdkError::Auth(reason) => assert_eq!(reason, "password is incorrect"),
        other => panic!("expected auth error, got {other:?}"),
    }
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn non_success_http_status_fails_login() {
    let server = server().await;
    let session = session_for(Credentials::default(), Arc::new(MemoryTokenStore::new()));

    let base = format!("{}/not-alist", server.url());
    let err = session
        .login(&Credentials::new(&base, "admin", "secret"))
        .await
        .unwrap_err();

    match err {
        SdkError::Auth(reason) => assert!(reason.starts_with("HTTP 404"), "{reason}"),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_fails_login_with_auth_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let session = session_for(Credentials::default(), Arc::new(MemoryTokenStore::new()));
    let err = session
        .login(&Credentials::new(&format!("http://{addr}"), "admin", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Auth(_)));
}

#[tokio::test]
async fn stale_record_triggers_one_login_then_reuse() {
    let server = server().await;
    let stale = TokenRecord::new("stale", Utc::now() + TimeDelta::minutes(4));
    let store = Arc::new(MemoryTokenStore::with_record(stale));
    let session = session_for(Credentials::new(&server.url(), "admin", "secret"), Arc::clone(&store));

    let first = session.ensure_valid_token().await.unwrap();
    let second = session.ensure_valid_token().await.unwrap();

    assert_ne!(first, "stale");
    assert_eq!(first, second);
    assert_eq!(server.state.login_calls(), 1);
}

#[tokio::test]
async fn out_of_range_persisted_expiry_is_treated_as_stale() {
    let server = server().await;
    let ancient: TokenRecord =
        serde_json::from_str(r#"{"token":"t","tokenExpiry":"-8334601228800000"}"#).unwrap();
    let store = Arc::new(MemoryTokenStore::with_record(ancient));
    let session = session_for(Credentials::new(&server.url(), "admin", "secret"), Arc::clone(&store));

    let token = session.ensure_valid_token().await.unwrap();

    assert_ne!(token, "t");
    assert_eq!(server.state.login_calls(), 1);
    assert_eq!(store.load().unwrap().map(|r| r.token), Some(token));
}

#[tokio::test]
async fn concurrent_refreshes_share_one_login() {
    let server = MockAList::new("admin", "secret")
        .with_login_delay(Duration::from_millis(200))
        .spawn()
        .await
        .unwrap();
    let session = Arc::new(session_for(
        Credentials::new(&server.url(), "admin", "secret"),
        Arc::new(MemoryTokenStore::new()),
    ));

    let (a, b, c) = futures::join!(
        session.ensure_valid_token(),
        session.ensure_valid_token(),
        session.ensure_valid_token(),
    );

    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(server.state.login_calls(), 1);
}

#[tokio::test]
async fn verify_token_tracks_server_side_validity() {
    let server = server().await;
    let session = session_for(
        Credentials::new(&server.url(), "admin", "secret"),
        Arc::new(MemoryTokenStore::new()),
    );

    assert!(!session.verify_token().await);

    session.ensure_valid_token().await.unwrap();
    assert!(session.verify_token().await);

    server.state.revoke_all_tokens();
    assert!(!session.verify_token().await);
    assert_eq!(server.state.me_calls(), 2);
}

#[tokio::test]
async fn clear_removes_persisted_record() {
    let server = server().await;
    let store = Arc::new(MemoryTokenStore::new());
    let session = session_for(Credentials::new(&server.url(), "admin", "secret"), Arc::clone(&store));

    session.ensure_valid_token().await.unwrap();
    assert!(store.load().unwrap().is_some());

    session.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    assert!(session.current_record().is_none());
}
