//! Choose Me Auto event bus and lead alert delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope.
//! - [`LeadAlertRouter`]: background consumer that turns lead events into
//!   email, Slack and SMS alerts.
//! - [`delivery`]: the external channels themselves.

pub mod alerts;
pub mod bus;
pub mod delivery;

pub use alerts::{LeadAlertRouter, NotificationStatus};
pub use bus::{EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::slack::SlackDelivery;
pub use delivery::sms::SmsDelivery;
