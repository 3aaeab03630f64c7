//! Typed request/response values and the HTTP seam.
//!
//! [`ApiRequest`] is plain data so the session can re-issue it with a fresh
//! bearer token after a refresh. [`HttpTransport`] is the only place that
//! touches the network; [`ReqwestTransport`] is the production implementation.

use async_trait::async_trait;
pub use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One file in a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FilePart>),
}

/// A request against the backend, relative to the configured base URL.
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path starting with `/`, e.g. `/api/organization`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Bearer token for the `Authorization` header.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// `POST` with a JSON body.
    pub fn post_json<T: Serialize>(path: impl Into<String>, body: &T) -> ClientResult<Self> {
        Self::new(Method::POST, path).with_json(body)
    }

    /// `PUT` with a JSON body.
    pub fn put_json<T: Serialize>(path: impl Into<String>, body: &T) -> ClientResult<Self> {
        Self::new(Method::PUT, path).with_json(body)
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> ClientResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_multipart(mut self, parts: Vec<FilePart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Copy of this request carrying `token` as its bearer.
    pub fn authorized(&self, token: &str) -> Self {
        Self {
            bearer: Some(token.to_string()),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Status and raw body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Error body shape: `{ "message": ... }`, or `{ "error": ... }` on some routes.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Response with a JSON body.
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode the body as JSON, regardless of status.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Backend error message: `message` or `error` from a JSON body, the raw
    /// text otherwise, or the bare status when the body is empty.
    pub fn error_message(&self) -> String {
        if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(&self.body) {
            if let Some(msg) = parsed.message.or(parsed.error) {
                return msg;
            }
        }
        let text = self.text();
        if text.trim().is_empty() {
            format!("HTTP {}", self.status)
        } else {
            text
        }
    }

    /// Return the response unchanged on 2xx, or an [`ClientError::Api`].
    pub fn ensure_success(self) -> ClientResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Api {
                status: self.status,
                message: self.error_message(),
            })
        }
    }

    /// Require 2xx and decode the JSON body.
    pub fn parse<T: DeserializeOwned>(self) -> ClientResult<T> {
        self.ensure_success()?.json()
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Sends one request and returns whatever status came back.
///
/// Implementations return `Err` only when no response was received.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse>;
}

/// [`HttpTransport`] backed by a pooled [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build a transport for `config.api_url` with the configured timeout.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn multipart_form(parts: &[FilePart]) -> ClientResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            let file = reqwest::multipart::Part::bytes(part.bytes.clone())
                .file_name(part.file_name.clone())
                .mime_str(&part.mime)?;
            form = form.part(part.field.clone(), file);
        }
        Ok(form)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(Self::multipart_form(parts)?),
        };

        tracing::debug!(method = %request.method, path = %request.path, "Sending request");
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        tracing::debug!(method = %request.method, path = %request.path, status, "Response received");

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn error_message_prefers_message_field() {
        let resp = ApiResponse::json_body(400, &json!({ "message": "Username sudah dipakai" }));
        assert_eq!(resp.error_message(), "Username sudah dipakai");
    }

    #[test]
    fn error_message_falls_back_to_error_field_then_text() {
        let resp = ApiResponse::json_body(409, &json!({ "error": "dup", "code": "CONFLICT" }));
        assert_eq!(resp.error_message(), "dup");

        let resp = ApiResponse::new(502, "Bad Gateway");
        assert_eq!(resp.error_message(), "Bad Gateway");

        let resp = ApiResponse::new(500, "");
        assert_eq!(resp.error_message(), "HTTP 500");
    }

    #[test]
    fn ensure_success_maps_status() {
        let err = ApiResponse::json_body(404, &json!({ "message": "not found" }))
            .ensure_success()
            .unwrap_err();
        assert_matches!(err, ClientError::Api { status: 404, ref message } if message == "not found");
        assert!(ApiResponse::new(204, "").ensure_success().is_ok());
    }

    #[test]
    fn authorized_copies_request_with_bearer() {
        let req = ApiRequest::get("/api/organization").with_query("page", 2);
        let authed = req.authorized("tok");
        assert_eq!(authed.bearer.as_deref(), Some("tok"));
        assert_eq!(authed.query, vec![("page".to_string(), "2".to_string())]);
        assert!(req.bearer.is_none());
    }

    #[test]
    fn debug_redacts_bearer() {
        let req = ApiRequest::get("/x").authorized("secret-token");
        assert!(!format!("{req:?}").contains("secret-token"));
    }
}
