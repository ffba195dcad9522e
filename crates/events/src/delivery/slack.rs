//! Slack incoming-webhook delivery with exponential-backoff retry.
//!
//! Failed attempts are retried up to three times with exponential backoff
//! (1 s, 2 s, 4 s).

use std::time::Duration;

use super::{env_non_empty, AlertMessage};

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// SlackDelivery
// ---------------------------------------------------------------------------

pub struct SlackDelivery {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackDelivery {
    /// `None` when `SLACK_WEBHOOK_URL` is unset.
    pub fn from_env() -> Result<Option<Self>, WebhookError> {
        match env_non_empty("SLACK_WEBHOOK_URL") {
            Some(url) => Ok(Some(Self::new(url)?)),
            None => Ok(None),
        }
    }

    pub fn new(webhook_url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    /// Slack block-kit payload: subject as header, body as preformatted text.
    pub fn payload(alert: &AlertMessage) -> serde_json::Value {
        serde_json::json!({
            "text": alert.subject,
            "blocks": [
                {
                    "type": "header",
                    "text": { "type": "plain_text", "text": alert.subject, "emoji": true }
                },
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": format!("```{}```", alert.body) }
                }
            ]
        })
    }

    /// Post an alert, retrying up to 3 times before giving up.
    pub async fn deliver(&self, alert: &AlertMessage) -> Result<(), WebhookError> {
        let payload = Self::payload(alert);
        let url = self.webhook_url.as_str();

        let mut last_err: Option<WebhookError> = None;

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "Slack delivery attempt failed, retrying"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        match self.try_send(&payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(url, error = %e, "Slack delivery failed after all retries");
                Err(last_err.unwrap_or(e))
            }
        }
    }

    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
