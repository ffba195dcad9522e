//! Lead alert routing.
//!
//! [`LeadAlertRouter`] subscribes to the [`EventBus`], renders an
//! [`AlertMessage`] for `lead.created` and `lead.status_changed` events, and
//! fans it out to every configured channel. Channels without configuration
//! are reported as deferred; nothing is sent unless `ALERTS_ENABLED=true`.

use std::sync::Arc;

use chooseme_core::leads::{name_with_initial, LeadType};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::bus::{EventBus, PlatformEvent, LEAD_CREATED, LEAD_STATUS_CHANGED};
use crate::delivery::email::{EmailConfig, EmailDelivery};
use crate::delivery::slack::SlackDelivery;
use crate::delivery::sms::{SmsDelivery, TwilioConfig};
use crate::delivery::{env_non_empty, AlertMessage};

const RULE: &str = "==================================================";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Global alert switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSettings {
    pub enabled: bool,
    pub on_new_lead: bool,
    pub on_status_change: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            on_new_lead: true,
            on_status_change: true,
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env_non_empty(key)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

impl AlertSettings {
    /// | Variable                 | Default |
    /// |--------------------------|---------|
    /// | `ALERTS_ENABLED`         | `false` |
    /// | `ALERT_ON_NEW_LEAD`      | `true`  |
    /// | `ALERT_ON_STATUS_CHANGE` | `true`  |
    pub fn from_env() -> Self {
        Self {
            enabled: env_flag("ALERTS_ENABLED", false),
            on_new_lead: env_flag("ALERT_ON_NEW_LEAD", true),
            on_status_change: env_flag("ALERT_ON_STATUS_CHANGE", true),
        }
    }
}

// ---------------------------------------------------------------------------
// Message rendering
// ---------------------------------------------------------------------------

/// The subset of a lead row carried in event payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadSnapshot {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub lead_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact_preference: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stock_id: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub vehicle_summary: Option<String>,
    #[serde(default)]
    pub preferred_date: Option<String>,
    #[serde(default)]
    pub preferred_time: Option<String>,
    /// Present on status-change events.
    #[serde(default)]
    pub old_status: Option<String>,
}

impl LeadSnapshot {
    fn type_label(&self) -> String {
        match self.lead_type.as_deref() {
            Some(raw) => LeadType::parse(raw)
                .map(|t| t.label().to_string())
                .unwrap_or_else(|_| raw.to_string()),
            None => "Unknown".to_string(),
        }
    }

    fn display_name(&self) -> String {
        name_with_initial(
            self.first_name.as_deref().unwrap_or("Unknown"),
            self.last_name.as_deref(),
        )
    }

    fn status_upper(&self) -> String {
        self.status.as_deref().unwrap_or("new").to_uppercase()
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

fn render_body(lead: &LeadSnapshot) -> String {
    let mut lines = vec![
        RULE.to_string(),
        format!("Lead Type: {}", lead.type_label()),
        format!("Status: {}", lead.status_upper()),
        String::new(),
        "Customer Info:".to_string(),
        format!(
            "   Name: {} {}",
            lead.first_name.as_deref().unwrap_or("Unknown"),
            lead.last_name.as_deref().unwrap_or("")
        )
        .trim_end()
        .to_string(),
        format!("   Phone: {}", non_empty(&lead.phone).unwrap_or("N/A")),
        format!("   Email: {}", non_empty(&lead.email).unwrap_or("N/A")),
    ];
    if let Some(pref) = non_empty(&lead.contact_preference) {
        lines.push(format!("   Preferred Contact: {pref}"));
    }

    let vehicle = non_empty(&lead.vehicle_summary);
    let stock = non_empty(&lead.stock_id);
    let vin = non_empty(&lead.vin);
    if vehicle.is_some() || stock.is_some() || vin.is_some() {
        lines.push(String::new());
        lines.push("Vehicle Info:".to_string());
        if let Some(v) = vehicle {
            lines.push(format!("   Vehicle: {v}"));
        }
        if let Some(s) = stock {
            lines.push(format!("   Stock #: {s}"));
        }
        if let Some(v) = vin {
            lines.push(format!("   VIN: {v}"));
        }
    }

    let date = non_empty(&lead.preferred_date);
    let time = non_empty(&lead.preferred_time);
    if date.is_some() || time.is_some() {
        lines.push(String::new());
        lines.push("Appointment:".to_string());
        if let Some(d) = date {
            lines.push(format!("   Date: {d}"));
        }
        if let Some(t) = time {
            lines.push(format!("   Time: {t}"));
        }
    }

    if let Some(m) = non_empty(&lead.message) {
        lines.push(String::new());
        lines.push("Message:".to_string());
        lines.push(format!("   {m}"));
    }

    lines.push(String::new());
    lines.push(RULE.to_string());
    lines.push("Choose Me Auto - Admin Panel".to_string());
    lines.join("\n")
}

/// Alert for a freshly captured lead.
pub fn new_lead_alert(lead: &LeadSnapshot) -> AlertMessage {
    let mut subject = format!("New {} Lead — {}", lead.type_label(), lead.display_name());
    if let Some(vehicle) = non_empty(&lead.vehicle_summary) {
        subject.push_str(&format!(" — {vehicle}"));
    }
    let sms_text = format!(
        "{subject}\n\nPhone: {}\nEmail: {}",
        non_empty(&lead.phone).unwrap_or("N/A"),
        non_empty(&lead.email).unwrap_or("N/A")
    );
    AlertMessage {
        subject,
        body: render_body(lead),
        sms_text,
    }
}

/// Alert for a status transition.
pub fn status_change_alert(lead: &LeadSnapshot) -> AlertMessage {
    let old = lead.old_status.as_deref().unwrap_or("unknown");
    let new = lead.status.as_deref().unwrap_or("unknown");
    let subject = format!(
        "Lead Status Changed — {} → {}",
        lead.display_name(),
        new.to_uppercase()
    );
    let body = format!(
        "{}\n\nStatus changed: {} → {}",
        render_body(lead),
        old.to_uppercase(),
        new.to_uppercase()
    );
    AlertMessage {
        sms_text: format!("{subject}\n{old} → {new}"),
        subject,
        body,
    }
}

// ---------------------------------------------------------------------------
// Channel status
// ---------------------------------------------------------------------------

/// Outcome of one delivery attempt on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "message")]
pub enum ChannelOutcome {
    Sent,
    Deferred,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub configured: bool,
    /// `"active"` or `"deferred"`.
    pub status: &'static str,
}

impl ChannelStatus {
    fn of(configured: bool) -> Self {
        Self {
            configured,
            status: if configured { "active" } else { "deferred" },
        }
    }
}

/// Body of `GET /api/notifications/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationStatus {
    pub alerts_enabled: bool,
    pub email: ChannelStatus,
    pub sms: ChannelStatus,
    pub slack: ChannelStatus,
}

/// Per-channel results of one alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertReport {
    pub email: ChannelOutcome,
    pub sms: ChannelOutcome,
    pub slack: ChannelOutcome,
}

impl AlertReport {
    pub fn notified(&self) -> bool {
        [&self.email, &self.sms, &self.slack]
            .iter()
            .any(|o| **o == ChannelOutcome::Sent)
    }
}

// ---------------------------------------------------------------------------
// LeadAlertRouter
// ---------------------------------------------------------------------------

/// Fans lead events out to the configured alert channels.
pub struct LeadAlertRouter {
    settings: AlertSettings,
    email: Option<EmailDelivery>,
    slack: Option<SlackDelivery>,
    sms: Option<SmsDelivery>,
}

impl LeadAlertRouter {
    pub fn new(
        settings: AlertSettings,
        email: Option<EmailDelivery>,
        slack: Option<SlackDelivery>,
        sms: Option<SmsDelivery>,
    ) -> Self {
        Self {
            settings,
            email,
            slack,
            sms,
        }
    }

    /// Build every channel from the environment. A channel whose client
    /// cannot be constructed is logged and left deferred.
    pub fn from_env() -> Self {
        let slack = SlackDelivery::from_env().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to initialise Slack delivery");
            None
        });
        let sms = TwilioConfig::from_env().and_then(|cfg| {
            SmsDelivery::new(cfg)
                .map_err(|e| tracing::error!(error = %e, "Failed to initialise SMS delivery"))
                .ok()
        });
        Self::new(
            AlertSettings::from_env(),
            EmailConfig::from_env().map(EmailDelivery::new),
            slack,
            sms,
        )
    }

    pub fn status(&self) -> NotificationStatus {
        NotificationStatus {
            alerts_enabled: self.settings.enabled,
            email: ChannelStatus::of(self.email.is_some()),
            sms: ChannelStatus::of(self.sms.is_some()),
            slack: ChannelStatus::of(self.slack.is_some()),
        }
    }

    /// Render the alert for an event, or `None` when the event is not a
    /// lead event or its alert kind is switched off.
    pub fn render(&self, event: &PlatformEvent) -> Option<AlertMessage> {
        if !self.settings.enabled {
            tracing::info!(event_type = %event.event_type, "Alerts disabled, skipping");
            return None;
        }
        let lead: LeadSnapshot = match serde_json::from_value(event.payload.clone()) {
            Ok(lead) => lead,
            Err(e) => {
                tracing::warn!(error = %e, event_type = %event.event_type, "Unreadable lead payload");
                return None;
            }
        };
        match event.event_type.as_str() {
            LEAD_CREATED if self.settings.on_new_lead => Some(new_lead_alert(&lead)),
            LEAD_STATUS_CHANGED if self.settings.on_status_change => {
                Some(status_change_alert(&lead))
            }
            _ => None,
        }
    }

    /// Send one alert through every channel.
    pub async fn dispatch(&self, alert: &AlertMessage) -> AlertReport {
        let email = match &self.email {
            None => ChannelOutcome::Deferred,
            Some(d) => d
                .deliver(alert)
                .await
                .map_or_else(|e| ChannelOutcome::Error(e.to_string()), |_| ChannelOutcome::Sent),
        };
        let sms = match &self.sms {
            None => ChannelOutcome::Deferred,
            Some(d) => d
                .deliver(alert)
                .await
                .map_or_else(|e| ChannelOutcome::Error(e.to_string()), |_| ChannelOutcome::Sent),
        };
        let slack = match &self.slack {
            None => ChannelOutcome::Deferred,
            Some(d) => d
                .deliver(alert)
                .await
                .map_or_else(|e| ChannelOutcome::Error(e.to_string()), |_| ChannelOutcome::Sent),
        };

        let report = AlertReport { email, sms, slack };
        for (channel, outcome) in [("email", &report.email), ("sms", &report.sms), ("slack", &report.slack)] {
            match outcome {
                ChannelOutcome::Error(msg) => {
                    tracing::error!(channel, error = %msg, subject = %alert.subject, "Alert delivery failed")
                }
                ChannelOutcome::Deferred => {
                    tracing::debug!(channel, "Alert channel not configured, deferred")
                }
                ChannelOutcome::Sent => {}
            }
        }
        report
    }

    /// Consume bus events until cancelled.
    pub async fn run(self: Arc<Self>, bus: Arc<EventBus>, cancel: CancellationToken) {
        let mut rx = bus.subscribe();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Lead alert router cancelled");
                    break;
                }
                received = rx.recv() => match received {
                    Ok(event) => {
                        if let Some(alert) = self.render(&event) {
                            self.dispatch(&alert).await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Lead alert router lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
