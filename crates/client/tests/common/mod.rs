#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use cakung_client::error::{ClientError, ClientResult};
use cakung_client::session::Session;
use cakung_client::token_store::MemoryTokenStore;
use cakung_client::transport::{ApiRequest, ApiResponse, HttpTransport, Method};

pub const LOGIN: &str = "/api/auth/login";
pub const REFRESH: &str = "/api/auth/refresh";
pub const STATUS: &str = "/api/auth/status";

/// What the fake answers for one request.
#[derive(Clone)]
enum Scripted {
    Respond(ApiResponse),
    Fail(String),
}

/// Scripted [`HttpTransport`].
///
/// Each `(method, path)` has a queue of answers. The last answer in a queue
/// is repeated for every further request. Unscripted routes answer 404.
/// Every request is recorded, in the order the fake handled it.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn push(&self, method: Method, path: &str, answer: Scripted) {
        self.routes
            .lock()
            .await
            .entry((method, path.to_string()))
            .or_default()
            .push_back(answer);
    }

    /// Queue a JSON response.
    pub async fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Scripted::Respond(ApiResponse::json_body(status, &body)))
            .await;
    }

    /// Queue a raw-body response.
    pub async fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(method, path, Scripted::Respond(ApiResponse::new(status, body)))
            .await;
    }

    /// Queue a failure where no response arrives.
    pub async fn fail(&self, method: Method, path: &str, message: &str) {
        self.push(method, path, Scripted::Fail(message.to_string()))
            .await;
    }

    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().await.clone()
    }

    /// Requests sent to `(method, path)`.
    pub async fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.log
            .lock()
            .await
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub async fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).await.len()
    }

    pub async fn total(&self) -> usize {
        self.log.lock().await.len()
    }

    /// Bearer tokens used against `(method, path)`, in order.
    pub async fn bearers(&self, method: Method, path: &str) -> Vec<Option<String>> {
        self.requests_to(method, path)
            .await
            .into_iter()
            .map(|r| r.bearer)
            .collect()
    }

    pub async fn clear_log(&self) {
        self.log.lock().await.clear();
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        // Let other in-flight requests interleave, as a real network would.
        tokio::task::yield_now().await;

        self.log.lock().await.push(request.clone());

        let answer = {
            let mut routes = self.routes.lock().await;
            match routes.get_mut(&(request.method.clone(), request.path.clone())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match answer {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(ClientError::Transport(message.into())),
            None => Ok(ApiResponse::json_body(
                404,
                &serde_json::json!({ "message": "no scripted route" }),
            )),
        }
    }
}

/// Session over `transport` with an in-memory token store, optionally
/// holding a refresh token from an earlier run.
pub fn session_with(
    transport: &Arc<FakeTransport>,
    stored_refresh: Option<&str>,
) -> (Arc<Session>, Arc<MemoryTokenStore>) {
    let store = Arc::new(match stored_refresh {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::new(),
    });
    let session = Session::new(transport.clone(), store.clone());
    (Arc::new(session), store)
}

/// Script a successful login returning `access` / `refresh`.
pub async fn script_login(transport: &FakeTransport, access: &str, refresh: &str, setup_mode: bool) {
    transport
        .respond(
            Method::POST,
            LOGIN,
            200,
            serde_json::json!({
                "access_token": access,
                "refresh_token": refresh,
                "setup_mode": setup_mode,
            }),
        )
        .await;
}

/// Script a successful refresh returning `access`.
pub async fn script_refresh(transport: &FakeTransport, access: &str) {
    transport
        .respond(
            Method::POST,
            REFRESH,
            200,
            serde_json::json!({ "access_token": access, "setup_mode": false }),
        )
        .await;
}

/// Logged-in session holding `access` in memory and `refresh` in its store.
pub async fn logged_in(
    transport: &Arc<FakeTransport>,
    access: &str,
    refresh: &str,
) -> (Arc<Session>, Arc<MemoryTokenStore>) {
    script_login(transport, access, refresh, false).await;
    let (session, store) = session_with(transport, None);
    assert!(session.login("admin", "secret1").await.is_success());
    transport.clear_log().await;
    (session, store)
}
