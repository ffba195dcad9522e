//! Client configuration.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:8001`. No trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `CHOOSEME_API_URL` (default `http://localhost:8001`) and
    /// `CHOOSEME_REQUEST_TIMEOUT_SECS` (default 30).
    pub fn from_env() -> Self {
        let base_url = std::env::var("CHOOSEME_API_URL")
            .unwrap_or_else(|_| "http://localhost:8001".into());
        let timeout = std::env::var("CHOOSEME_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        Self::new(base_url).with_timeout(timeout)
    }

    /// Absolute URL for an API path such as `/api/vehicles`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
