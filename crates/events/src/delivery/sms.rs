//! SMS lead alerts through the Twilio Messages REST API.

use std::time::Duration;

use super::{env_non_empty, AlertMessage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Longer texts are cut here and suffixed with `...`.
const MAX_SMS_CHARS: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Twilio returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
}

impl TwilioConfig {
    /// All of `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_FROM` and
    /// `ALERT_SMS_TO` must be set.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            account_sid: env_non_empty("TWILIO_ACCOUNT_SID")?,
            auth_token: env_non_empty("TWILIO_AUTH_TOKEN")?,
            from_number: env_non_empty("TWILIO_FROM")?,
            to_number: env_non_empty("ALERT_SMS_TO")?,
        })
    }
}

/// Cap an SMS body at [`MAX_SMS_CHARS`] characters.
pub fn truncate_sms(text: &str) -> String {
    if text.chars().count() <= MAX_SMS_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_SMS_CHARS).collect();
    format!("{cut}...")
}

pub struct SmsDelivery {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl SmsDelivery {
    pub fn new(config: TwilioConfig) -> Result<Self, SmsError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    pub async fn deliver(&self, alert: &AlertMessage) -> Result<(), SmsError> {
        let url = format!(
            "{TWILIO_API_BASE}/Accounts/{}/Messages.json",
            self.config.account_sid
        );
        let body = truncate_sms(&alert.sms_text);
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("From", self.config.from_number.as_str()),
                ("To", self.config.to_number.as_str()),
                ("Body", body.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!("Lead alert SMS sent");
        Ok(())
    }
}
