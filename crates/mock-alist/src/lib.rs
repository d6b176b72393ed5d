//! In-process mock of the AList HTTP API.
//!
//! Serves the subset of endpoints the preview core talks to, with the same
//! envelope semantics as a real server (HTTP 200 with an embedded failure
//! `code` for application errors):
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `POST /api/auth/login` | issues a random token for the configured account |
//! | `POST /api/fs/get` | metadata for a seeded file, `401` code for unknown tokens |
//! | `GET /api/me` | token check |
//! | `GET /d/{*path}` | raw content (download route) |
//! | `GET /p/{*path}` | raw content (proxy route, advertised as `raw_url`) |
//!
//! Call counters and recorded request paths let tests assert on exactly
//! which network calls were made.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use alist_models::{
    ApiResponse, FsGetRequest, FsObject, LoginData, LoginRequest, TOKEN_INVALID_CODE,
};
use axum::extract::{Json, Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// A file served by the mock.
#[derive(Debug, Clone)]
pub struct MockFile {
    /// Raw content served by the download routes.
    pub content: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// RFC 3339 modification time.
    pub modified: String,
    /// Advertise a `raw_url` in metadata; when `false` clients must build
    /// the download URL themselves.
    pub advertise_raw_url: bool,
}

impl MockFile {
    /// A regular file with the given content.
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            is_dir: false,
            modified: "2024-05-01T10:00:00Z".to_string(),
            advertise_raw_url: true,
        }
    }

    /// A directory entry.
    pub fn dir() -> Self {
        Self {
            content: String::new(),
            is_dir: true,
            ..Self::text("")
        }
    }

    /// Omit `raw_url` from the metadata answer.
    pub fn without_raw_url(mut self) -> Self {
        self.advertise_raw_url = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Mock server state: one account, a file table and call counters.
#[derive(Debug)]
pub struct MockAList {
    username: String,
    password: String,
    files: Mutex<HashMap<String, MockFile>>,
    tokens: Mutex<HashSet<String>>,
    base_url: OnceLock<String>,
    login_delay: Mutex<Duration>,
    fail_raw: AtomicBool,
    garbled_metadata: AtomicBool,
    login_calls: AtomicUsize,
    fs_get_calls: AtomicUsize,
    me_calls: AtomicUsize,
    raw_calls: AtomicUsize,
    fs_get_paths: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAList {
    /// A mock accepting exactly one username / password pair.
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            files: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashSet::new()),
            base_url: OnceLock::new(),
            login_delay: Mutex::new(Duration::ZERO),
            fail_raw: AtomicBool::new(false),
            garbled_metadata: AtomicBool::new(false),
            login_calls: AtomicUsize::new(0),
            fs_get_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            raw_calls: AtomicUsize::new(0),
            fs_get_paths: Mutex::new(Vec::new()),
        }
    }

    /// Seed a file at an absolute path.
    pub fn with_file(self, path: &str, file: MockFile) -> Self {
        self.insert_file(path, file);
        self
    }

    /// Delay every login answer, to widen race windows in tests.
    pub fn with_login_delay(self, delay: Duration) -> Self {
        *lock(&self.login_delay) = delay;
        self
    }

    /// Seed or replace a file while the server is running.
    pub fn insert_file(&self, path: &str, file: MockFile) {
        lock(&self.files).insert(path.to_string(), file);
    }

    /// Answer metadata requests with an HTML page instead of JSON, as a
    /// reverse proxy in maintenance mode does.
    pub fn set_garbled_metadata(&self, garbled: bool) {
        self.garbled_metadata.store(garbled, Ordering::SeqCst);
    }

    /// Make the raw content routes answer `500`.
    pub fn set_fail_raw(&self, fail: bool) {
        self.fail_raw.store(fail, Ordering::SeqCst);
    }

    /// Forget every issued token, as a server restart or logout would.
    pub fn revoke_all_tokens(&self) {
        lock(&self.tokens).clear();
    }

    /// Number of `POST /api/auth/login` requests received.
    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    /// Number of `POST /api/fs/get` requests received.
    pub fn fs_get_calls(&self) -> usize {
        self.fs_get_calls.load(Ordering::SeqCst)
    }

    /// Number of `GET /api/me` requests received.
    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    /// Number of raw content requests received.
    pub fn raw_calls(&self) -> usize {
        self.raw_calls.load(Ordering::SeqCst)
    }

    /// Every path requested through `POST /api/fs/get`, in order.
    pub fn fs_get_paths(&self) -> Vec<String> {
        lock(&self.fs_get_paths).clone()
    }

    /// Total number of requests of any kind.
    pub fn total_calls(&self) -> usize {
        self.login_calls() + self.fs_get_calls() + self.me_calls() + self.raw_calls()
    }

    fn token_is_valid(&self, headers: &HeaderMap) -> bool {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|token| lock(&self.tokens).contains(token))
    }

    /// Bind an ephemeral local port and serve in a background task.
    pub async fn spawn(self) -> std::io::Result<MockServer> {
        self.spawn_on("127.0.0.1:0").await
    }

    /// Bind `addr` and serve in a background task.
    pub async fn spawn_on(self, addr: &str) -> std::io::Result<MockServer> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(self);
        let _ = state.base_url.set(format!("http://{addr}"));

        let app = router(Arc::clone(&state));
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "mock server stopped");
            }
        });

        debug!(address = %addr, "mock AList listening");
        Ok(MockServer {
            addr,
            state,
            handle,
        })
    }
}

/// A running mock; the server task is aborted on drop.
#[derive(Debug)]
pub struct MockServer {
    /// Bound socket address.
    pub addr: SocketAddr,
    /// Shared state, for seeding and assertions.
    pub state: Arc<MockAList>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Base URL of the server, without trailing slash.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait until the server task ends (it only does on error or abort).
    pub async fn wait(mut self) {
        let _ = (&mut self.handle).await;
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Build the router over shared state.
pub fn router(state: Arc<MockAList>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/fs/get", post(fs_get))
        .route("/api/me", get(me))
        .route("/d/{*path}", get(raw))
        .route("/p/{*path}", get(raw))
        .with_state(state)
}

async fn login(
    State(state): State<Arc<MockAList>>,
    Json(req): Json<LoginRequest>,
) -> Json<ApiResponse<LoginData>> {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    let delay = *lock(&state.login_delay);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if req.username != state.username || req.password != state.password {
        info!(username = %req.username, "login rejected");
        return Json(ApiResponse::failure(400, "password is incorrect"));
    }

    let token = format!("mock-{}", uuid::Uuid::new_v4());
    lock(&state.tokens).insert(token.clone());
    info!(username = %req.username, "login accepted");
    Json(ApiResponse::ok(LoginData { token }))
}

async fn fs_get(
    State(state): State<Arc<MockAList>>,
    headers: HeaderMap,
    Json(req): Json<FsGetRequest>,
) -> Response {
    state.fs_get_calls.fetch_add(1, Ordering::SeqCst);
    lock(&state.fs_get_paths).push(req.path.clone());

    if state.garbled_metadata.load(Ordering::SeqCst) {
        return (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/html")],
            "<html><body>Service under maintenance</body></html>",
        )
            .into_response();
    }

    if !state.token_is_valid(&headers) {
        return Json(ApiResponse::<FsObject>::failure(TOKEN_INVALID_CODE, "token is invalidated"))
            .into_response();
    }

    let Some(file) = lock(&state.files).get(&req.path).cloned() else {
        return Json(ApiResponse::<FsObject>::failure(500, "object not found")).into_response();
    };

    let name = req
        .path
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let raw_url = file.advertise_raw_url.then(|| {
        let base = state.base_url.get().cloned().unwrap_or_default();
        format!("{base}/p{}", req.path)
    });

    Json(ApiResponse::ok(FsObject {
        name,
        size: file.content.len() as u64,
        is_dir: file.is_dir,
        modified: file.modified,
        raw_url,
    }))
    .into_response()
}

async fn me(State(state): State<Arc<MockAList>>, headers: HeaderMap) -> Json<Value> {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if state.token_is_valid(&headers) {
        Json(json!({ "code": 200, "message": "success", "data": { "username": state.username } }))
    } else {
        Json(json!({ "code": TOKEN_INVALID_CODE, "message": "token is invalidated", "data": null }))
    }
}

async fn raw(State(state): State<Arc<MockAList>>, Path(path): Path<String>) -> Response {
    state.raw_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_raw.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "storage offline").into_response();
    }

    let path = format!("/{path}");
    match lock(&state.files).get(&path) {
        Some(file) if !file.is_dir => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            file.content.clone(),
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}
