//! Client configuration.
//!
//! The token and endpoint are fixed for the lifetime of a client. The
//! endpoint defaults to the public v2 API but is always overridable, which is
//! how tests point the client at the mock server.

use std::time::Duration;

use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.poeditor.com/v2";

/// Network timeout applied to each request, connect included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const TOKEN_ENV: &str = "POEDITOR_API_TOKEN";
pub const BASE_URL_ENV: &str = "POEDITOR_API_URL";

#[derive(Clone)]
pub struct ClientConfig {
    api_token: String,
    base_url: String,
    timeout: Duration,
}

impl ClientConfig {
    /// Configuration for the public API. Fails if `api_token` is blank.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(ApiError::invalid("api token is required"));
        }
        Ok(Self {
            api_token,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read `POEDITOR_API_TOKEN` and, if set, `POEDITOR_API_URL`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| ApiError::invalid(format!("{TOKEN_ENV} is not set")))?;
        let config = Self::new(token)?;
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => config.with_base_url(&url),
            _ => Ok(config),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::invalid(format!(
                "base url must start with http:// or https://, got {base_url:?}"
            )));
        }
        self.base_url = base_url.to_string();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// The token stays out of logs and panic messages.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
