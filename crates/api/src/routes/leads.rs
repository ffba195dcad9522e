//! Route definitions for leads.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::leads;
use crate::state::AppState;

/// Routes mounted at `/leads`.
///
/// ```text
/// POST   /                -> create (public)
/// GET    /                -> list (admin; ?status=&lead_type=)
/// GET    /stats/summary   -> stats (admin)
/// PATCH  /{id}            -> update_status (admin)
/// DELETE /{id}            -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(leads::list).post(leads::create))
        .route("/stats/summary", get(leads::stats))
        .route("/{id}", patch(leads::update_status).delete(leads::delete))
}

/// Routes mounted at `/vehicle-leads`.
///
/// ```text
/// POST /  -> create_vehicle_lead (public)
/// ```
pub fn vehicle_leads_router() -> Router<AppState> {
    Router::new().route("/", post(leads::create_vehicle_lead))
}
