pub mod admin;
pub mod health;
pub mod leads;
pub mod vehicles;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                                          health (status + db)
/// /version                                         version, service, environment
///
/// /vehicles                                        public inventory list
/// /vehicles/featured                               homepage strip (?limit=)
/// /vehicles/{stock_id}                             vehicle detail
///
/// /vehicle-leads                                   availability lead (POST, public)
/// /leads                                           create (POST, public), list (admin)
/// /leads/stats/summary                             lead counts (admin)
/// /leads/{id}                                      status patch, delete (admin)
///
/// /admin/login                                     admin login (public)
/// /admin/vehicles                                  list, create
/// /admin/vehicles/import-csv                       CSV preview / commit
/// /admin/vehicles/csv-template                     CSV template download
/// /admin/vehicles/{id}                             get, patch, delete
/// /admin/vehicles/{id}/photos                      upload
/// /admin/vehicles/{id}/photos/{photo_id}           delete
/// /admin/vehicles/{id}/photos/{photo_id}/primary   set primary
///
/// /notifications/status                            alert channel status
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::api_router())
        .nest("/vehicles", vehicles::router())
        .nest("/vehicle-leads", leads::vehicle_leads_router())
        .nest("/leads", leads::router())
        .nest("/admin", admin::router())
        .route(
            "/notifications/status",
            get(handlers::notifications::status),
        )
}
