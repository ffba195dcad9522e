//! Bulk inventory import: `/api/admin/vehicles/import-csv` and the template.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chooseme_core::csv_import::{
    build_plan, check_upload, generate_csv_template, parse_csv_content, CsvImportError,
    CsvImportReport, ImportAction, ImportPlan, MAX_CSV_SIZE_BYTES, TEMPLATE_FILENAME,
};
use chooseme_core::vehicle::generate_stock_number;
use chooseme_db::models::vehicle::{CreateVehicle, UpdateVehicle};
use chooseme_db::repositories::VehicleRepo;
use chooseme_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::admin::RequireAdmin;
use crate::query::DryRunParams;
use crate::state::AppState;

/// Multipart field carrying the CSV file.
const FILE_FIELD: &str = "file";

/// Request body cap for the import route. Anything between the file limit
/// and this cap is rejected by the size check with its user-facing message.
pub const IMPORT_BODY_LIMIT: usize = MAX_CSV_SIZE_BYTES * 2;

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CsvImportError::TooLarge.into()
    } else {
        err.into()
    }
}

/// Read the single `file` part.
async fn read_csv_file(multipart: &mut Multipart) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok((name, bytes.to_vec()));
    }
    Err(AppError::BadRequest("No file uploaded".into()))
}

/// POST /api/admin/vehicles/import-csv?dry_run={bool} (multipart `file`)
///
/// Every request re-parses and re-validates the file; a commit never
/// trusts an earlier preview.
pub async fn import_csv(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<DryRunParams>,
    mut multipart: Multipart,
) -> AppResult<Json<CsvImportReport>> {
    let (name, bytes) = read_csv_file(&mut multipart).await?;
    check_upload(&name, bytes.len())?;

    let parsed = parse_csv_content(&bytes)?;
    let existing = VehicleRepo::existing_vins(&state.pool, &parsed.candidate_vins()).await?;
    let plan = build_plan(&parsed, &existing);

    tracing::info!(
        file = %name,
        dry_run = params.dry_run,
        total = plan.total_rows(),
        to_create = plan.to_create.len(),
        to_update = plan.to_update.len(),
        skipped = plan.skipped.len(),
        "Planned CSV import"
    );

    if params.dry_run {
        return Ok(Json(plan.report(true)));
    }
    Ok(Json(apply_plan(&state.pool, &plan).await))
}

/// Write every valid row. Row failures are recorded, never fatal.
async fn apply_plan(pool: &DbPool, plan: &ImportPlan) -> CsvImportReport {
    let mut report = plan.report(false);

    for planned in plan.rows_to_apply() {
        let vin = planned.data.vin.as_str();
        match planned.action {
            ImportAction::Create => {
                let input = CreateVehicle::from(&planned.data);
                let stock_number = input
                    .stock_number
                    .clone()
                    .unwrap_or_else(generate_stock_number);
                match VehicleRepo::create(pool, &input, &stock_number).await {
                    Ok(vehicle) => {
                        tracing::info!(row = planned.row, vin, vehicle_id = vehicle.id, "Imported vehicle");
                        report.record_created();
                    }
                    Err(e) => {
                        tracing::warn!(row = planned.row, vin, error = %e, "CSV row failed to insert");
                        report.record_failure(vin, e);
                    }
                }
            }
            ImportAction::Update => {
                let input = UpdateVehicle::from(&planned.data);
                match VehicleRepo::update_by_vin(pool, vin, &input).await {
                    Ok(Some(vehicle)) => {
                        tracing::info!(row = planned.row, vin, vehicle_id = vehicle.id, "Updated vehicle from CSV");
                        report.record_updated();
                    }
                    Ok(None) => report.record_failure(vin, "vehicle no longer exists"),
                    Err(e) => {
                        tracing::warn!(row = planned.row, vin, error = %e, "CSV row failed to update");
                        report.record_failure(vin, e);
                    }
                }
            }
        }
    }

    report.finish();
    tracing::info!(
        created = report.counts.created,
        updated = report.counts.updated,
        skipped = report.counts.skipped,
        "CSV import committed"
    );
    report
}

/// GET /api/admin/vehicles/csv-template
pub async fn csv_template(RequireAdmin(_): RequireAdmin) -> AppResult<impl IntoResponse> {
    let body = generate_csv_template()?;
    let disposition = format!("attachment; filename=\"{TEMPLATE_FILENAME}\"");
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
