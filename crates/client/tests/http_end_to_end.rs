//! End-to-end tests over real HTTP: the `reqwest` transport against an
//! in-process `axum` stub of the backend bound to an ephemeral port.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use cakung_client::config::ClientConfig;
use cakung_client::organization::OrganizationApi;
use cakung_client::postings::AssetApi;
use cakung_client::session::{LoginOutcome, Session, SessionState};
use cakung_client::transport::FilePart;

// ---------------------------------------------------------------------------
// Stub backend
// ---------------------------------------------------------------------------

/// Tokens issued by login are already expired for data routes, so the first
/// data request always exercises refresh-and-retry.
const LOGIN_ACCESS: &str = "access-expired";
const REFRESH_TOKEN: &str = "refresh-valid";

#[derive(Default)]
struct StubState {
    refreshes: usize,
    uploads: Vec<(String, String, usize)>,
}

type Shared = Arc<Mutex<StubState>>;

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
}

fn bearer_is_fresh(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token.starts_with("access-fresh-"))
}

async fn status() -> Json<serde_json::Value> {
    Json(json!({ "setup_required": false }))
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    if body.username == "admin" && body.password == "secret1" {
        Json(json!({
            "access_token": LOGIN_ACCESS,
            "refresh_token": REFRESH_TOKEN,
            "setup_mode": false,
        }))
        .into_response()
    } else {
        unauthorized("Username atau password salah")
    }
}

async fn refresh(State(state): State<Shared>, Json(body): Json<RefreshBody>) -> Response {
    if body.refresh_token != REFRESH_TOKEN {
        return unauthorized("Invalid refresh token");
    }
    let mut guard = state.lock().unwrap();
    guard.refreshes += 1;
    Json(json!({
        "access_token": format!("access-fresh-{}", guard.refreshes),
        "setup_mode": false,
    }))
    .into_response()
}

async fn organization(headers: HeaderMap) -> Response {
    if !bearer_is_fresh(&headers) {
        return unauthorized("Token expired");
    }
    Json(json!([
        { "id": 1, "parent_id": null, "level": 0, "name": "Siti", "position": "Lurah", "role": "lurah", "photo": "" },
        { "id": 2, "parent_id": 1, "level": 1, "name": "Budi", "position": "Sekretaris", "role": "sekretaris", "photo": "" }
    ]))
    .into_response()
}

async fn upload(
    State(state): State<Shared>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !bearer_is_fresh(&headers) {
        return unauthorized("Token expired");
    }
    let mut assets = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        let mut guard = state.lock().unwrap();
        guard.uploads.push((name, file_name.clone(), bytes));
        assets.push(json!({
            "id": guard.uploads.len(),
            "post_id": post_id,
            "url": format!("/uploads/{file_name}"),
        }));
    }
    (StatusCode::CREATED, Json(assets)).into_response()
}

async fn spawn_backend() -> (SocketAddr, Shared) {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route("/api/auth/status", get(status))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/organization", get(organization))
        .route("/api/assets/posts/{id}", post(upload))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn config_for(addr: SocketAddr, dir: &tempfile::TempDir) -> ClientConfig {
    ClientConfig {
        api_url: format!("http://{addr}"),
        token_store_path: dir.path().join("refresh_token"),
        request_timeout_secs: 5,
        cache_ttl_secs: 300,
    }
}

// ---------------------------------------------------------------------------
// Test: full session flow
// ---------------------------------------------------------------------------

/// Login, an expired-token request that refreshes and retries, and a second
/// process resuming from the token file.
#[tokio::test]
async fn login_refresh_retry_and_resume() {
    let (addr, stub) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(addr, &dir);

    let session = Arc::new(Session::from_config(&config).unwrap());
    let snapshot = session.initialize().await;
    assert_eq!(snapshot.state, SessionState::Unauthenticated);
    assert_eq!(snapshot.auth_status.map(|s| s.setup_required), Some(false));

    let outcome = session.login("admin", "secret1").await;
    assert_eq!(outcome, LoginOutcome::Success { setup_mode: false });
    assert_eq!(
        std::fs::read_to_string(&config.token_store_path).unwrap(),
        REFRESH_TOKEN
    );

    let entries = OrganizationApi::new(session.clone()).list().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].parent_id, Some(1));
    assert_eq!(stub.lock().unwrap().refreshes, 1);

    // Second run reads the token file and resumes.
    let resumed = Session::from_config(&config).unwrap();
    let snapshot = resumed.initialize().await;
    assert_eq!(snapshot.state, SessionState::Authenticated);
    assert_eq!(stub.lock().unwrap().refreshes, 2);

    session.logout().await;
    assert!(!config.token_store_path.exists());
}

/// Wrong credentials report the backend's message verbatim.
#[tokio::test]
async fn wrong_password_reason_is_verbatim() {
    let (addr, _) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let session = Session::from_config(&config_for(addr, &dir)).unwrap();

    let outcome = session.login("admin", "nope").await;

    assert_eq!(
        outcome,
        LoginOutcome::Failure {
            reason: "Username atau password salah".into()
        }
    );
}

/// An unreachable backend during initialization clears the stored token.
#[tokio::test]
async fn unreachable_backend_clears_stored_token() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(addr, &dir);
    std::fs::write(&config.token_store_path, "refresh-valid").unwrap();

    let session = Session::from_config(&config).unwrap();
    let snapshot = session.initialize().await;

    assert_eq!(snapshot.state, SessionState::Unauthenticated);
    assert!(!config.token_store_path.exists());
}

// ---------------------------------------------------------------------------
// Test: multipart upload
// ---------------------------------------------------------------------------

/// Files arrive as multipart parts named `file`.
#[tokio::test]
async fn asset_upload_sends_multipart() {
    let (addr, stub) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let session = Arc::new(Session::from_config(&config_for(addr, &dir)).unwrap());
    assert!(session.login("admin", "secret1").await.is_success());

    let assets = AssetApi::new(session)
        .upload(
            4,
            vec![
                FilePart::new("ignored", "kegiatan.jpg", "image/jpeg", vec![0xFF; 32]),
                FilePart::new("ignored", "poster.png", "image/png", vec![0x89; 8]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].post_id, Some(4));
    assert_eq!(assets[1].url.as_deref(), Some("/uploads/poster.png"));

    let uploads = stub.lock().unwrap().uploads.clone();
    assert_eq!(
        uploads,
        vec![
            ("file".to_string(), "kegiatan.jpg".to_string(), 32),
            ("file".to_string(), "poster.png".to_string(), 8),
        ]
    );
}
