use axum::{
    extract::{Extension, State},
    Json,
};
use std::sync::Arc;

use super::owned_staff;
use crate::models::{
    AvailabilityRequest, AvailabilityResponse, IntervalCheckRequest, IntervalCheckResponse,
    TimeRange,
};
use crate::scheduling::{find_conflict, SlotGrid, SlotQuery};
use crate::server::middleware::AuthenticatedAccount;
use crate::server::{ApiError, AppState};

/// Open start times for a staff member, date and set of services
pub async fn query_availability(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    owned_staff(&state.db, &account, &req.staff_id)?;

    let grid = SlotGrid::from(account.hours);
    let query = SlotQuery {
        staff_id: &req.staff_id,
        date: req.date,
        service_ids: &req.service_ids,
        exclude_id: req.exclude_id.as_deref(),
    };
    let (duration_minutes, slots) = state.scheduler(&account).open_slots(&grid, &query).await?;

    Ok(Json(AvailabilityResponse {
        duration_minutes,
        slots,
    }))
}

/// Whether one explicit interval is free
pub async fn check_interval(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Json(req): Json<IntervalCheckRequest>,
) -> Result<Json<IntervalCheckResponse>, ApiError> {
    owned_staff(&state.db, &account, &req.staff_id)?;
    if req.end <= req.start {
        return Err(ApiError::BadRequest(
            "End time must be after start time".to_string(),
        ));
    }

    let conflict = find_conflict(
        &state.db,
        &req.staff_id,
        req.date,
        &TimeRange::new(req.start, req.end),
        req.exclude_id.as_deref(),
    )
    .await?;

    Ok(Json(IntervalCheckResponse {
        available: conflict.is_none(),
        conflicting_appointment_id: conflict.map(|c| c.id),
    }))
}
