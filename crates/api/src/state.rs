use std::sync::{Arc, Mutex};

use chooseme_core::login_throttle::LoginThrottle;
use chooseme_events::{EventBus, LeadAlertRouter};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: chooseme_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus that lead handlers publish to.
    pub event_bus: Arc<EventBus>,
    /// Alert channels, queried by the notification status endpoint.
    pub alerts: Arc<LeadAlertRouter>,
    /// Failed admin logins per client IP.
    pub login_throttle: Arc<Mutex<LoginThrottle>>,
}
