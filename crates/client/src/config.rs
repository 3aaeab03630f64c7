use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Default backend base URL.
const DEFAULT_API_URL: &str = "http://localhost:8080";
/// Default request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default response cache lifetime in seconds.
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Token file location relative to the home directory.
const TOKEN_FILE: &str = ".cakung-admin/refresh_token";

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash.
    pub api_url: String,
    /// File holding the refresh token between runs.
    pub token_store_path: PathBuf,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Lifetime of cached list responses in seconds.
    pub cache_ttl_secs: u64,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                               |
    /// |------------------------|---------------------------------------|
    /// | `API_URL`              | `http://localhost:8080`               |
    /// | `TOKEN_STORE_PATH`     | `$HOME/.cakung-admin/refresh_token`   |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                  |
    /// | `CACHE_TTL_SECS`       | `300`                                 |
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let token_store_path = match lookup("TOKEN_STORE_PATH").filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => lookup("HOME")
                .map(|home| PathBuf::from(home).join(TOKEN_FILE))
                .unwrap_or_else(|| PathBuf::from(TOKEN_FILE)),
        };

        let request_timeout_secs =
            parse_u64(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let cache_ttl_secs = parse_u64(&lookup, "CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;

        Ok(Self {
            api_url: normalize_url(&api_url),
            token_store_path,
            request_timeout_secs,
            cache_ttl_secs,
        })
    }

    /// Override the backend URL.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_url(api_url);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> ClientResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ClientError::Config(format!("{key} must be a valid u64, got {raw:?}"))),
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
