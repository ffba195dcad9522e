//! Admin inventory management: `/api/admin/vehicles`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chooseme_core::error::CoreError;
use chooseme_core::types::DbId;
use chooseme_core::vehicle::{generate_stock_number, validate_vin};
use chooseme_db::models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle};
use chooseme_db::repositories::VehicleRepo;
use chrono::Datelike;
use validator::Validate;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::admin::RequireAdmin;
use crate::state::AppState;
use crate::uploads::remove_vehicle_dir;

const DUPLICATE_VIN: &str = "Vehicle with this VIN already exists.";

const EARLIEST_MODEL_YEAR: i32 = 1900;

fn check_year(year: i32) -> Result<(), CoreError> {
    let max = chrono::Utc::now().year() + 2;
    if !(EARLIEST_MODEL_YEAR..=max).contains(&year) {
        return Err(CoreError::Validation(format!(
            "year must be between {EARLIEST_MODEL_YEAR} and {max}"
        )));
    }
    Ok(())
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("Vehicle", id))
}

/// POST /api/admin/vehicles
pub async fn create(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateVehicle>,
) -> AppResult<(StatusCode, Json<Vehicle>)> {
    input.validate()?;
    input.vin = validate_vin(&input.vin).map_err(CoreError::Validation)?;
    check_year(input.year)?;

    if VehicleRepo::find_by_vin(&state.pool, &input.vin).await?.is_some() {
        return Err(AppError::BadRequest(DUPLICATE_VIN.into()));
    }

    let stock_number = input
        .stock_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_stock_number);

    let vehicle = VehicleRepo::create(&state.pool, &input, &stock_number)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "uq_vehicles_vin") {
                AppError::BadRequest(DUPLICATE_VIN.into())
            } else {
                AppError::Database(e)
            }
        })?;

    tracing::info!(vehicle_id = vehicle.id, vin = %vehicle.vin, "Created vehicle");
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// GET /api/admin/vehicles
///
/// Every vehicle including inactive ones, newest first.
pub async fn list(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let vehicles = VehicleRepo::list_all(&state.pool).await?;
    Ok(Json(vehicles))
}

/// GET /api/admin/vehicles/{id}
pub async fn get_by_id(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vehicle>> {
    let vehicle = VehicleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(vehicle))
}

/// PATCH /api/admin/vehicles/{id}
///
/// Only the fields present in the body change.
pub async fn update(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateVehicle>,
) -> AppResult<Json<Vehicle>> {
    input.validate()?;
    if let Some(year) = input.year {
        check_year(year)?;
    }
    let vehicle = VehicleRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(vehicle_id = id, "Updated vehicle");
    Ok(Json(vehicle))
}

/// DELETE /api/admin/vehicles/{id}
///
/// Also removes the vehicle's uploaded photos from disk.
pub async fn delete(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !VehicleRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    remove_vehicle_dir(&state.config.upload_dir, id).await;
    tracing::info!(vehicle_id = id, "Deleted vehicle");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_bounds() {
        assert!(check_year(1900).is_ok());
        assert!(check_year(1899).is_err());
        let next = chrono::Utc::now().year() + 2;
        assert!(check_year(next).is_ok());
        assert!(check_year(next + 1).is_err());
    }
}
