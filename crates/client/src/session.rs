//! Authentication session: the access/refresh token pair and the state
//! derived from it.
//!
//! The access token lives only in memory. The refresh token lives in a
//! [`TokenStore`] so a later run can resume silently. Any failed refresh,
//! rejected or unreachable alike, logs the session out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::token_store::{FileTokenStore, TokenStore};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

const STATUS_PATH: &str = "/api/auth/status";
const LOGIN_PATH: &str = "/api/auth/login";
const REFRESH_PATH: &str = "/api/auth/refresh";

/// Reason reported when the backend gives none.
const DEFAULT_LOGIN_FAILURE: &str = "Login failed";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `GET /api/auth/status` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatus {
    /// No admin exists yet; the first login bootstraps one.
    #[serde(default)]
    pub setup_required: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    setup_mode: bool,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    setup_mode: bool,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// Point-in-time view of the session, safe to hand to UI code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// True until [`Session::initialize`] has finished.
    pub is_loading: bool,
    /// The backend flagged this session as first-run admin bootstrap.
    pub setup_mode: bool,
    pub auth_status: Option<AuthStatus>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }
}

/// Result of [`Session::login`]. Failures are values, not errors, because
/// the caller is a form that shows the reason to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success { setup_mode: bool },
    Failure { reason: String },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success { .. })
    }
}

struct SessionInner {
    state: SessionState,
    is_loading: bool,
    access_token: Option<String>,
    setup_mode: bool,
    auth_status: Option<AuthStatus>,
}

impl SessionInner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            is_loading: self.is_loading,
            setup_mode: self.setup_mode,
            auth_status: self.auth_status.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Owns the tokens and issues every authenticated request.
///
/// Constructed once per process and passed by reference (usually inside an
/// `Arc`) to each API wrapper. The inner lock is never held across a
/// network call, so overlapping requests each run their own refresh.
pub struct Session {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn TokenStore>,
    inner: RwLock<SessionInner>,
}

impl Session {
    pub fn new(transport: Arc<dyn HttpTransport>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            transport,
            store,
            inner: RwLock::new(SessionInner {
                state: SessionState::Uninitialized,
                is_loading: true,
                access_token: None,
                setup_mode: false,
                auth_status: None,
            }),
        }
    }

    /// Session over the real HTTP transport and the file token store.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(config)?;
        let store = FileTokenStore::new(config.token_store_path.clone());
        Ok(Self::new(Arc::new(transport), Arc::new(store)))
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().await.snapshot()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.state == SessionState::Authenticated
    }

    pub async fn setup_mode(&self) -> bool {
        self.inner.read().await.setup_mode
    }

    /// Resume from the stored refresh token, if any.
    ///
    /// Runs once; later calls return the current snapshot. The status query
    /// is best-effort. A stored token that cannot be exchanged is removed.
    pub async fn initialize(&self) -> SessionSnapshot {
        {
            let mut inner = self.inner.write().await;
            if inner.state != SessionState::Uninitialized {
                return inner.snapshot();
            }
            inner.state = SessionState::Initializing;
            inner.is_loading = true;
        }

        self.check_auth_status().await;

        let mut outcome = SessionState::Unauthenticated;
        if let Some(stored) = self.load_refresh_token() {
            match self.exchange_refresh_token(&stored).await {
                Ok(grant) => {
                    let mut inner = self.inner.write().await;
                    inner.access_token = Some(grant.access_token);
                    inner.setup_mode = grant.setup_mode;
                    outcome = SessionState::Authenticated;
                    tracing::info!(setup_mode = grant.setup_mode, "Session resumed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stored refresh token rejected, clearing it");
                    if let Err(e) = self.store.clear() {
                        tracing::warn!(error = %e, "Failed to clear refresh token");
                    }
                }
            }
        }

        let mut inner = self.inner.write().await;
        // A login that completed meanwhile wins.
        if inner.state == SessionState::Initializing {
            inner.state = outcome;
        }
        inner.is_loading = false;
        inner.snapshot()
    }

    /// Query `/api/auth/status` and remember the answer.
    ///
    /// Returns `None` on any failure; the previous status is kept.
    pub async fn check_auth_status(&self) -> Option<AuthStatus> {
        match self.fetch_auth_status().await {
            Ok(status) => {
                self.inner.write().await.auth_status = Some(status.clone());
                Some(status)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to check auth status");
                None
            }
        }
    }

    async fn fetch_auth_status(&self) -> ClientResult<AuthStatus> {
        self.transport
            .send(&ApiRequest::get(STATUS_PATH))
            .await?
            .parse()
    }

    /// Exchange credentials for a token pair.
    pub async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        let grant = match self.request_login(username, password).await {
            Ok(grant) => grant,
            Err(reason) => {
                tracing::info!(username, reason = %reason, "Login failed");
                return LoginOutcome::Failure { reason };
            }
        };

        if let Err(e) = self.store.save(&grant.refresh_token) {
            tracing::warn!(error = %e, "Failed to persist refresh token");
        }

        let mut inner = self.inner.write().await;
        inner.access_token = Some(grant.access_token);
        inner.setup_mode = grant.setup_mode;
        inner.state = SessionState::Authenticated;
        tracing::info!(username, setup_mode = grant.setup_mode, "Logged in");

        LoginOutcome::Success {
            setup_mode: grant.setup_mode,
        }
    }

    async fn request_login(&self, username: &str, password: &str) -> Result<LoginResponse, String> {
        let request = ApiRequest::post_json(LOGIN_PATH, &LoginRequest { username, password })
            .map_err(|e| e.to_string())?;
        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_success() {
            return Err(login_failure_reason(&response));
        }
        response.json().map_err(|e| e.to_string())
    }

    /// Drop both tokens and leave setup mode. Safe to call repeatedly.
    pub async fn logout(&self) {
        {
            let mut inner = self.inner.write().await;
            inner.access_token = None;
            inner.setup_mode = false;
            if inner.state == SessionState::Authenticated {
                tracing::info!("Logged out");
            }
            if inner.state != SessionState::Initializing {
                inner.state = SessionState::Unauthenticated;
            }
        }
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear refresh token");
        }
    }

    /// In-memory access token, or the result of a silent refresh.
    pub async fn get_access_token(&self) -> Option<String> {
        let cached = self.inner.read().await.access_token.clone();
        match cached {
            Some(token) => Some(token),
            None => self.refresh_access_token().await,
        }
    }

    /// Obtain a new access token with the stored refresh token.
    ///
    /// Without a stored token no request is made. Any failure logs out.
    pub async fn refresh_access_token(&self) -> Option<String> {
        let stored = self.load_refresh_token()?;

        match self.exchange_refresh_token(&stored).await {
            Ok(grant) => {
                let mut inner = self.inner.write().await;
                inner.access_token = Some(grant.access_token.clone());
                inner.setup_mode = grant.setup_mode;
                inner.state = SessionState::Authenticated;
                tracing::debug!("Access token refreshed");
                Some(grant.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, logging out");
                self.logout().await;
                None
            }
        }
    }

    /// Send `request` with a bearer token, refreshing and retrying once on 401.
    ///
    /// Fails with [`ClientError::Unauthenticated`] before any network call
    /// when no token can be obtained. If the refresh after a 401 fails, the
    /// original 401 response is returned. Every other status is returned as
    /// received.
    pub async fn authenticated_request(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let token = self
            .get_access_token()
            .await
            .ok_or(ClientError::Unauthenticated)?;

        let response = self.transport.send(&request.authorized(&token)).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        tracing::debug!(path = %request.path, "Access token rejected, refreshing");
        match self.refresh_access_token().await {
            Some(fresh) => self.transport.send(&request.authorized(&fresh)).await,
            None => Ok(response),
        }
    }

    fn load_refresh_token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read refresh token");
                None
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> ClientResult<RefreshResponse> {
        let request = ApiRequest::post_json(REFRESH_PATH, &RefreshRequest { refresh_token })?;
        self.transport.send(&request).await?.parse()
    }
}

fn login_failure_reason(response: &ApiResponse) -> String {
    #[derive(Deserialize)]
    struct Body {
        message: Option<String>,
    }
    response
        .json::<Body>()
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_reason_taken_verbatim() {
        let resp = ApiResponse::json_body(
            401,
            &serde_json::json!({ "message": "Username atau password salah" }),
        );
        assert_eq!(login_failure_reason(&resp), "Username atau password salah");
    }

    #[test]
    fn login_reason_defaults_without_message() {
        assert_eq!(login_failure_reason(&ApiResponse::new(500, "oops")), "Login failed");
        let resp = ApiResponse::json_body(400, &serde_json::json!({ "message": "" }));
        assert_eq!(login_failure_reason(&resp), "Login failed");
    }

    #[test]
    fn auth_status_keeps_unknown_fields() {
        let status: AuthStatus =
            serde_json::from_str(r#"{"setup_required":true,"admin_count":0}"#).unwrap();
        assert!(status.setup_required);
        assert_eq!(status.extra["admin_count"], 0);
    }

    #[test]
    fn outcome_flag() {
        assert!(LoginOutcome::Success { setup_mode: false }.is_success());
        assert!(!LoginOutcome::Failure { reason: "x".into() }.is_success());
    }
}
