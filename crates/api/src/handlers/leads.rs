//! Lead capture (public) and lead management (admin).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chooseme_core::error::CoreError;
use chooseme_core::leads::{LeadInput, LeadStats, LeadStatus, LeadType, VehicleLeadInput};
use chooseme_core::types::DbId;
use chooseme_db::models::lead::{Lead, LeadFilter, UpdateLeadStatus};
use chooseme_db::repositories::LeadRepo;
use chooseme_events::bus::{LEAD_CREATED, LEAD_STATUS_CHANGED};
use chooseme_events::PlatformEvent;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::admin::RequireAdmin;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("Lead", id))
}

fn lead_event(event_type: &str, lead: &Lead, old_status: Option<&str>) -> PlatformEvent {
    let mut payload = serde_json::to_value(lead).unwrap_or_default();
    if let (Some(old), Some(obj)) = (old_status, payload.as_object_mut()) {
        obj.insert("old_status".into(), old.into());
    }
    PlatformEvent::new(event_type)
        .with_source("lead", lead.id)
        .with_payload(payload)
}

async fn capture(state: &AppState, input: &LeadInput) -> AppResult<Lead> {
    let lead = LeadRepo::create(&state.pool, input).await?;
    tracing::info!(lead_id = lead.id, lead_type = %lead.lead_type, "Lead captured");
    state
        .event_bus
        .publish(lead_event(LEAD_CREATED, &lead, None));
    Ok(lead)
}

/// POST /api/vehicle-leads
///
/// "Call for availability" form on a vehicle page.
pub async fn create_vehicle_lead(
    State(state): State<AppState>,
    Json(input): Json<VehicleLeadInput>,
) -> AppResult<(StatusCode, Json<Lead>)> {
    input.validate()?;
    let lead = capture(&state, &LeadInput::from(input)).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// POST /api/leads
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<LeadInput>,
) -> AppResult<(StatusCode, Json<Lead>)> {
    input.validate()?;
    let lead = capture(&state, &input).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /api/leads?status=&lead_type=
pub async fn list(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<LeadFilter>,
) -> AppResult<Json<Vec<Lead>>> {
    let filter = LeadFilter {
        status: filter
            .status
            .filter(|s| !s.is_empty())
            .map(|s| LeadStatus::parse(&s).map(|st| st.as_str().to_string()))
            .transpose()?,
        lead_type: filter
            .lead_type
            .filter(|t| !t.is_empty())
            .map(|t| LeadType::parse(&t).map(|lt| lt.as_str().to_string()))
            .transpose()?,
    };
    let leads = LeadRepo::list(&state.pool, &filter).await?;
    Ok(Json(leads))
}

/// GET /api/leads/stats/summary
pub async fn stats(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<LeadStats>> {
    Ok(Json(LeadRepo::stats(&state.pool).await?))
}

/// PATCH /api/leads/{id}
pub async fn update_status(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateLeadStatus>,
) -> AppResult<Json<Lead>> {
    let status = LeadStatus::parse(&input.status)?;
    let existing = LeadRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let lead = LeadRepo::update_status(&state.pool, id, status.as_str())
        .await?
        .ok_or_else(|| not_found(id))?;

    if existing.status != lead.status {
        tracing::info!(lead_id = id, from = %existing.status, to = %lead.status, "Lead status changed");
        state
            .event_bus
            .publish(lead_event(LEAD_STATUS_CHANGED, &lead, Some(&existing.status)));
    }
    Ok(Json(lead))
}

/// DELETE /api/leads/{id}
pub async fn delete(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if LeadRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
