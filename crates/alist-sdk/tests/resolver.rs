use std::sync::Arc;

use alist_models::{Credentials, LinkTarget, TokenRecord};
use alist_sdk::{MemoryTokenStore, RemoteFileResolver, SdkError, SessionManager};
use chrono::{TimeDelta, Utc};
use mock_alist::{MockAList, MockFile, MockServer};

async fn server() -> MockServer {
    MockAList::new("admin", "secret")
        .with_file("/test/file.txt", MockFile::text("hello world"))
        .with_file("/test/photo.png", MockFile::text("png bytes").without_raw_url())
        .spawn()
        .await
        .unwrap()
}

fn resolver_for(base_url: &str, store: MemoryTokenStore) -> RemoteFileResolver {
    let session = SessionManager::new(
        Arc::new(Credentials::new(base_url, "admin", "secret")),
        Arc::new(store),
    )
    .unwrap();
    RemoteFileResolver::new(Arc::new(session))
}

fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn fresh_record() -> TokenRecord {
    TokenRecord::new("persisted", Utc::now() + TimeDelta::hours(1))
}

#[tokio::test]
async fn scheme_link_resolves_decoded_path() {
    let server = server().await;
    let resolver = resolver_for(&server.url(), MemoryTokenStore::new());

    let path = LinkTarget::parse("alist://%2Ftest%2Ffile.txt")
        .unwrap()
        .decode_path()
        .unwrap();
    let file = resolver.resolve(&path).await.unwrap();

    assert_eq!(server.state.fs_get_paths(), vec!["/test/file.txt".to_string()]);
    assert_eq!(file.path, "/test/file.txt");
    assert_eq!(file.name, "file.txt");
    assert_eq!(file.size, 11);
    assert!(!file.is_directory);
    assert_eq!(file.modified_at, "2024-05-01T10:00:00Z");
    assert_eq!(file.raw_url, format!("{}/p/test/file.txt", server.url()));
}

#[tokio::test]
async fn missing_raw_url_falls_back_to_download_route() {
    let server = server().await;
    let resolver = resolver_for(&server.url(), MemoryTokenStore::new());

    let file = resolver.resolve("/test/photo.png").await.unwrap();
    assert_eq!(file.raw_url, format!("{}/d/test/photo.png", server.url()));
}

#[tokio::test]
async fn unknown_path_is_api_error() {
    let server = server().await;
    let resolver = resolver_for(&server.url(), MemoryTokenStore::new());

    match resolver.resolve("/missing.txt").await {
        Err(SdkError::Api { code, message }) => {
            assert_eq!(code, 500);
            assert_eq!(message, "object not found");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn revoked_token_is_refreshed_exactly_once() {
    let server = server().await;
    let resolver = resolver_for(&server.url(), MemoryTokenStore::new());

    resolver.resolve("/test/file.txt").await.unwrap();
    server.state.revoke_all_tokens();
    resolver.resolve("/test/file.txt").await.unwrap();

    assert_eq!(server.state.login_calls(), 2);
    assert_eq!(server.state.fs_get_calls(), 3);
}

#[tokio::test]
async fn unissued_persisted_token_is_replaced_on_first_use() {
    let server = server().await;
    // Valid by expiry, but never issued by this server.
    let resolver = resolver_for(&server.url(), MemoryTokenStore::with_record(fresh_record()));

    let file = resolver.resolve("/test/file.txt").await.unwrap();
    assert_eq!(file.name, "file.txt");
    assert_eq!(server.state.login_calls(), 1);
    assert_eq!(server.state.fs_get_calls(), 2);
}

#[tokio::test]
async fn transport_failure_is_network_error() {
    let resolver = resolver_for(&closed_port_url(), MemoryTokenStore::with_record(fresh_record()));
    assert!(matches!(
        resolver.resolve("/test/file.txt").await,
        Err(SdkError::Network(_))
    ));
}

#[tokio::test]
async fn non_success_status_is_network_error() {
    let server = server().await;
    let base = format!("{}/not-alist", server.url());
    let resolver = resolver_for(&base, MemoryTokenStore::with_record(fresh_record()));

    match resolver.resolve("/test/file.txt").await {
        Err(SdkError::Network(reason)) => assert!(reason.starts_with("HTTP 404"), "{reason}"),
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn login_failure_aborts_before_metadata_call() {
    let server = server().await;
    let session = SessionManager::new(
        Arc::new(Credentials::new(&server.url(), "admin", "wrong")),
        Arc::new(MemoryTokenStore::new()),
    )
    .unwrap();
    let resolver = RemoteFileResolver::new(Arc::new(session));

    assert!(matches!(
        resolver.resolve("/test/file.txt").await,
        Err(SdkError::Auth(_))
    ));
    assert_eq!(server.state.fs_get_calls(), 0);
}

#[tokio::test]
async fn fetch_text_reads_raw_content() {
    let server = server().await;
    let resolver = resolver_for(&server.url(), MemoryTokenStore::new());

    let file = resolver.resolve("/test/file.txt").await.unwrap();
    let content = resolver.fetch_text(&file.raw_url, 1024).await.unwrap();
    assert_eq!(content.text, "hello world");
    assert!(!content.truncated);
    assert_eq!(content.total_bytes, Some(11));
}

#[tokio::test]
async fn fetch_text_stops_at_the_byte_cap() {
    let server = server().await;
    server.state.insert_file("/test/big.log", MockFile::text(&"é".repeat(5000)));
    let resolver = resolver_for(&server.url(), MemoryTokenStore::new());

    let file = resolver.resolve("/test/big.log").await.unwrap();
    let content = resolver.fetch_text(&file.raw_url, 1001).await.unwrap();

    assert!(content.truncated);
    assert_eq!(content.text, "é".repeat(500));
    assert_eq!(content.total_bytes, Some(10_000));
}

#[tokio::test]
async fn metadata_answered_with_a_web_page_is_a_network_error() {
    let server = server().await;
    server.state.set_garbled_metadata(true);
    let resolver = resolver_for(&server.url(), MemoryTokenStore::new());

    match resolver.resolve("/test/file.txt").await {
        Err(SdkError::Network(reason)) => {
            assert!(reason.starts_with("invalid response body"), "{reason}");
        }
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_text_failure_is_preview_error() {
    let server = server().await;
    server.state.set_fail_raw(true);
    let resolver = resolver_for(&server.url(), MemoryTokenStore::new());

    let url = format!("{}/d/test/file.txt", server.url());
    match resolver.fetch_text(&url, 1024).await {
        Err(SdkError::Preview(reason)) => assert!(reason.starts_with("HTTP 500"), "{reason}"),
        other => panic!("expected preview error, got {other:?}"),
    }
}
