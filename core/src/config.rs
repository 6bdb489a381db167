//! Client configuration.
//!
//! Credentials are resolved once, when the client is constructed. The read
//! key comes from the caller or from the environment; the trusted-write id
//! and secret are only ever supplied explicitly and default to empty, which
//! means trusted writes fail authentication until they are set.

use std::time::Duration;

use tracing::debug;

use crate::error::ApiError;

/// Primary environment variable holding the read API key.
pub const API_KEY_ENV: &str = "TBA_API_KEY";
/// Fallback environment variable holding the read API key.
pub const API_KEY_FALLBACK_ENV: &str = "API_KEY";
/// Origin of the public service.
pub const DEFAULT_ORIGIN: &str = "https://www.thebluealliance.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub auth_id: String,
    pub auth_secret: String,
    pub origin: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            auth_id: String::new(),
            auth_secret: String::new(),
            origin: DEFAULT_ORIGIN.to_string(),
            timeout: None,
        }
    }

    /// Reads the API key from `TBA_API_KEY`, then `API_KEY`, after loading a
    /// `.env` file if one is present.
    pub fn from_env() -> Result<Self, ApiError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let key = resolve_api_key(|name| std::env::var(name).ok())?;
        Ok(Self::new(key))
    }

    pub fn with_trusted_auth(mut self, auth_id: impl Into<String>, auth_secret: impl Into<String>) -> Self {
        self.auth_id = auth_id.into();
        self.auth_secret = auth_secret.into();
        self
    }

    /// Points the client at another origin; a trailing slash is dropped.
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Root of the v3 read API, e.g. `https://www.thebluealliance.com/api/v3`.
    pub fn read_root(&self) -> String {
        format!("{}/api/v3", self.origin)
    }
}

fn resolve_api_key(lookup: impl Fn(&str) -> Option<String>) -> Result<String, ApiError> {
    [API_KEY_ENV, API_KEY_FALLBACK_ENV]
        .into_iter()
        .find_map(|name| lookup(name).filter(|value| !value.is_empty()))
        .ok_or_else(|| {
            ApiError::Config(format!(
                "no API key: set {API_KEY_ENV} or {API_KEY_FALLBACK_ENV}"
            ))
        })
}
