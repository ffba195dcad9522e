//! Alert channel status.

use axum::extract::State;
use axum::Json;
use chooseme_events::NotificationStatus;

use crate::state::AppState;

/// GET /api/notifications/status
pub async fn status(State(state): State<AppState>) -> Json<NotificationStatus> {
    Json(state.alerts.status())
}
