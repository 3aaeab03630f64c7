use cakung_core::error::CoreError;

/// Errors surfaced by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No access token and no refresh token to obtain one. No request was
    /// sent.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The backend answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `message` from the error body, verbatim when present.
        message: String,
    },

    /// The operation is not allowed in the current session state.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A response body did not match the expected shape.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading or writing the durable token store failed.
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A domain-level error, usually form validation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(Box::new(err))
    }
}

impl ClientError {
    /// HTTP status of an [`ClientError::Api`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;
