use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

use super::{owned_client, owned_staff};
use crate::db::Database;
use crate::models::{
    Account, Appointment, AppointmentList, CreateAppointmentRequest, DateWindow,
    UpdateAppointmentRequest,
};
use crate::server::middleware::AuthenticatedAccount;
use crate::server::{ApiError, AppState};
use crate::webhook::{WebhookEvent, WebhookEventData, WebhookEventType};

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub staff_id: Option<String>,
}

impl AppointmentQuery {
    /// Defaults to today, or the single day `from` when `to` is absent
    pub fn window(&self) -> Result<DateWindow, ApiError> {
        let from = self.from.unwrap_or_else(|| Local::now().date_naive());
        let to = self.to.unwrap_or(from);
        if to < from {
            return Err(ApiError::BadRequest(
                "'to' must not be before 'from'".to_string(),
            ));
        }
        Ok(DateWindow::new(from, to))
    }
}

/// Bookable staff member: owned by the account and active
fn bookable_staff(db: &Database, account: &Account, id: &str) -> Result<(), ApiError> {
    let staff = owned_staff(db, account, id)?;
    if !staff.active {
        return Err(ApiError::BadRequest(format!(
            "{} is not taking appointments",
            staff.name
        )));
    }
    Ok(())
}

fn owned_appointment(db: &Database, account: &Account, id: &str) -> Result<Appointment, ApiError> {
    db.get_appointment(id)?
        .filter(|a| a.account_id == account.id)
        .ok_or(ApiError::NotFound("Appointment"))
}

/// List appointments in a date window
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<AppointmentList>, ApiError> {
    let window = query.window()?;
    let appointments =
        state
            .db
            .list_appointments(&account.id, window, query.staff_id.as_deref())?;
    Ok(Json(AppointmentList { appointments }))
}

/// Book an appointment
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    owned_client(&state.db, &account, &req.client_id)?;
    bookable_staff(&state.db, &account, &req.staff_id)?;

    let appointment = state.scheduler(&account).book(req).await?;

    state.notify(
        &account,
        WebhookEvent::for_appointment(WebhookEventType::AppointmentCreated, &appointment),
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    Ok(Json(owned_appointment(&state.db, &account, &id)?))
}

/// Edit an appointment; moving it re-checks availability
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAppointmentRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let before = owned_appointment(&state.db, &account, &id)?;
    if let Some(client_id) = &req.client_id {
        owned_client(&state.db, &account, client_id)?;
    }
    if let Some(staff_id) = &req.staff_id {
        bookable_staff(&state.db, &account, staff_id)?;
    }

    let after = state.scheduler(&account).reschedule(&id, req).await?;

    state.notify(
        &account,
        WebhookEvent::new(
            WebhookEventType::for_update(before.status, after.status),
            WebhookEventData::from(&after).moved_from(&before),
        ),
    );
    Ok(Json(after))
}

/// Cancel an appointment, freeing its slot
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let canceled = state.scheduler(&account).cancel(&id).await?;
    state.notify(
        &account,
        WebhookEvent::for_appointment(WebhookEventType::AppointmentCanceled, &canceled),
    );
    Ok(Json(canceled))
}

/// Delete an appointment permanently
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let deleted = state.scheduler(&account).delete(&id).await?;
    state.notify(
        &account,
        WebhookEvent::for_appointment(WebhookEventType::AppointmentDeleted, &deleted),
    );
    Ok(Json(deleted))
}
