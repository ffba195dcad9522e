//! Client-side error type.

/// Shown when nothing more specific is known.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network, DNS or body decoding failure.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Server returned HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Http { status: u16, detail: Option<String> },

    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Validation(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,

    /// An admin-only call was made without a session.
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Session storage error: {0}")]
    Session(String),
}

impl ClientError {
    /// Message for the admin panel. Server `detail` text is shown as is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            Self::Validation(msg) => msg.clone(),
            Self::Timeout => "The request timed out. Please try again.".to_string(),
            Self::Cancelled => "The request was cancelled.".to_string(),
            Self::NotLoggedIn => "Please log in again.".to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Whether repeating the same action can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::Cancelled => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Validation(_) | Self::NotLoggedIn | Self::Session(_) => false,
        }
    }

    /// Build an [`ClientError::Http`] from an error response body, picking
    /// up the `detail` field when the body is the server's JSON error.
    pub fn from_response_body(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));
        Self::Http { status, detail }
    }
}
