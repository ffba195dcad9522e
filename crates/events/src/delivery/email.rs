//! Lead alert delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport. Configuration
//! is loaded from the environment; when `SMTP_HOST` or `ALERT_EMAIL_TO` is
//! missing, [`EmailConfig::from_env`] returns `None` and the channel stays
//! deferred.

use super::{env_non_empty, AlertMessage};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// A recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_FROM_ADDRESS: &str = "alerts@choosemeauto.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    /// Alert recipients.
    pub to_addresses: Vec<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable         | Required | Default                      |
    /// |------------------|----------|------------------------------|
    /// | `SMTP_HOST`      | yes      | none                         |
    /// | `ALERT_EMAIL_TO` | yes      | none (comma-separated list)  |
    /// | `SMTP_PORT`      | no       | `587`                        |
    /// | `SMTP_FROM`      | no       | `SMTP_USER`, else a default  |
    /// | `SMTP_USER`      | no       | none                         |
    /// | `SMTP_PASSWORD`  | no       | none                         |
    pub fn from_env() -> Option<Self> {
        let smtp_host = env_non_empty("SMTP_HOST")?;
        let to_addresses: Vec<String> = env_non_empty("ALERT_EMAIL_TO")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if to_addresses.is_empty() {
            return None;
        }
        let smtp_user = env_non_empty("SMTP_USER");
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: env_non_empty("SMTP_FROM")
                .or_else(|| smtp_user.clone())
                .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user,
            smtp_password: env_non_empty("SMTP_PASSWORD"),
            to_addresses,
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send a plain-text alert to every configured recipient.
    pub async fn deliver(&self, alert: &AlertMessage) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let mut builder = Message::builder()
            .from(self.config.from_address.parse()?)
            .subject(alert.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for to in &self.config.to_addresses {
            builder = builder.to(to.parse()?);
        }
        let email = builder
            .body(alert.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            recipients = self.config.to_addresses.len(),
            subject = %alert.subject,
            "Lead alert email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
