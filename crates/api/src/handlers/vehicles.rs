//! Public inventory handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chooseme_core::error::CoreError;
use chooseme_db::models::vehicle::{VehicleDetail, VehicleFilter, VehicleListItem};
use chooseme_db::repositories::vehicle_repo::clamp_featured_limit;
use chooseme_db::repositories::VehicleRepo;

use crate::error::{AppError, AppResult};
use crate::query::LimitParams;
use crate::state::AppState;

/// GET /api/vehicles
///
/// Active vehicles only, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<VehicleFilter>,
) -> AppResult<Json<Vec<VehicleListItem>>> {
    let vehicles = VehicleRepo::list_active(&state.pool, &filter).await?;
    Ok(Json(vehicles.iter().map(VehicleListItem::from).collect()))
}

/// GET /api/vehicles/featured?limit=
pub async fn featured(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<Vec<VehicleListItem>>> {
    let limit = clamp_featured_limit(params.limit);
    let vehicles = VehicleRepo::list_featured(&state.pool, limit).await?;
    Ok(Json(vehicles.iter().map(VehicleListItem::from).collect()))
}

/// GET /api/vehicles/{stock_id}
pub async fn get_by_stock_id(
    State(state): State<AppState>,
    Path(stock_id): Path<String>,
) -> AppResult<Json<VehicleDetail>> {
    let vehicle = VehicleRepo::find_active_by_stock_number(&state.pool, &stock_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Vehicle", &stock_id)))?;
    Ok(Json(VehicleDetail::from(&vehicle)))
}
