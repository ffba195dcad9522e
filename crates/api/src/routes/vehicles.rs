//! Route definitions for the public `/vehicles` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::vehicles;
use crate::state::AppState;

/// Routes mounted at `/vehicles`.
///
/// ```text
/// GET /                -> list (filters: make, model, min_price, max_price, body_style, condition)
/// GET /featured        -> featured (?limit=)
/// GET /{stock_id}      -> get_by_stock_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(vehicles::list))
        .route("/featured", get(vehicles::featured))
        .route("/{stock_id}", get(vehicles::get_by_stock_id))
}
