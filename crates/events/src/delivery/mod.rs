//! External delivery channels for lead alerts.
//!
//! Each channel is optional: it is constructed only when its configuration
//! is present in the environment, and reported as `deferred` otherwise.

pub mod email;
pub mod slack;
pub mod sms;

/// A rendered alert, ready for any channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
    /// Short form for SMS.
    pub sms_text: String,
}

/// Read an environment variable, treating blank values as unset.
pub(crate) fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
