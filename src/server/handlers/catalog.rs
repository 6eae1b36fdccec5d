//! Clients, services, categories and staff.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{owned_client, owned_staff};
use crate::db::Database;
use crate::models::{
    is_valid_color, Account, Category, Client, CreateCategoryRequest, CreateClientRequest,
    CreateServiceRequest, CreateStaffRequest, Service, Staff, UpdateClientRequest,
    UpdateServiceRequest, UpdateStaffRequest,
};
use crate::scheduling::StoreError;
use crate::server::middleware::AuthenticatedAccount;
use crate::server::{ApiError, AppState};

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Empty strings clear optional text fields
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Serialize, Deserialize)]
pub struct Deleted {
    pub deleted: String,
}

// ==================== Clients ====================

#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    pub search: Option<String>,
}

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(
        state
            .db
            .list_clients(&account.id, query.search.as_deref())?,
    ))
}

pub async fn create_client(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Json(req): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let client = Client {
        id: new_id("client"),
        account_id: account.id.clone(),
        name: required("Name", &req.name)?,
        phone: optional(req.phone),
        email: optional(req.email),
        notes: optional(req.notes),
        created_at: Utc::now().timestamp(),
    };
    state.db.create_client(&client)?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<Client>, ApiError> {
    Ok(Json(owned_client(&state.db, &account, &id)?))
}

pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
    Json(req): Json<UpdateClientRequest>,
) -> Result<Json<Client>, ApiError> {
    let mut client = owned_client(&state.db, &account, &id)?;
    if let Some(name) = req.name {
        client.name = required("Name", &name)?;
    }
    if req.phone.is_some() {
        client.phone = optional(req.phone);
    }
    if req.email.is_some() {
        client.email = optional(req.email);
    }
    if req.notes.is_some() {
        client.notes = optional(req.notes);
    }
    state.db.update_client(&client)?;
    Ok(Json(client))
}

pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError> {
    owned_client(&state.db, &account, &id)?;
    state.db.delete_client(&id)?;
    tracing::info!(client_id = %id, "Deleted client and their appointments");
    Ok(Json(Deleted { deleted: id }))
}

// ==================== Services ====================

#[derive(Debug, Default, Deserialize)]
pub struct ActiveQuery {
    /// Include inactive entries
    #[serde(default)]
    pub all: bool,
}

fn owned_service(db: &Database, account: &Account, id: &str) -> Result<Service, ApiError> {
    db.get_service(id)?
        .filter(|s| s.account_id == account.id)
        .ok_or(ApiError::NotFound("Service"))
}

/// Create the category if the account does not have it yet
fn ensure_category(db: &Database, account: &Account, name: &str) -> Result<(), ApiError> {
    let category = Category {
        id: new_id("cat"),
        account_id: account.id.clone(),
        name: name.to_string(),
    };
    match db.create_category(&category) {
        Ok(()) | Err(StoreError::Conflict(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<Vec<Service>>, ApiError> {
    Ok(Json(state.db.list_services(&account.id, !query.all)?))
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let service = Service {
        id: new_id("svc"),
        account_id: account.id.clone(),
        name: required("Name", &req.name)?,
        duration: required("Duration", &req.duration)?,
        price_cents: req.price_cents,
        category: optional(req.category),
        active: req.active,
        created_at: Utc::now().timestamp(),
    };
    if service.price_cents < 0 {
        return Err(ApiError::BadRequest("Price cannot be negative".to_string()));
    }
    state.policy.resolve(&service.id, &service.duration)?;

    if let Some(category) = &service.category {
        ensure_category(&state.db, &account, category)?;
    }
    state.db.create_service(&service)?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<Service>, ApiError> {
    Ok(Json(owned_service(&state.db, &account, &id)?))
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
    Json(req): Json<UpdateServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    let mut service = owned_service(&state.db, &account, &id)?;
    if let Some(name) = req.name {
        service.name = required("Name", &name)?;
    }
    if let Some(duration) = req.duration {
        service.duration = required("Duration", &duration)?;
        state.policy.resolve(&service.id, &service.duration)?;
    }
    if let Some(price_cents) = req.price_cents {
        if price_cents < 0 {
            return Err(ApiError::BadRequest("Price cannot be negative".to_string()));
        }
        service.price_cents = price_cents;
    }
    if req.category.is_some() {
        service.category = optional(req.category);
        if let Some(category) = &service.category {
            ensure_category(&state.db, &account, category)?;
        }
    }
    if let Some(active) = req.active {
        service.active = active;
    }
    state.db.update_service(&service)?;
    Ok(Json(service))
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError> {
    owned_service(&state.db, &account, &id)?;
    state.db.delete_service(&id)?;
    Ok(Json(Deleted { deleted: id }))
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.db.list_categories(&account.id)?))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = Category {
        id: new_id("cat"),
        account_id: account.id.clone(),
        name: required("Name", &req.name)?,
    };
    state.db.create_category(&category)?;
    Ok((StatusCode::CREATED, Json(category)))
}

// ==================== Staff ====================

pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<Vec<Staff>>, ApiError> {
    Ok(Json(state.db.list_staff(&account.id, !query.all)?))
}

pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Json(req): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<Staff>), ApiError> {
    if !is_valid_color(&req.color) {
        return Err(ApiError::BadRequest(format!("Invalid color {:?}", req.color)));
    }
    let staff = Staff {
        id: new_id("staff"),
        account_id: account.id.clone(),
        name: required("Name", &req.name)?,
        color: req.color,
        active: req.active,
        created_at: Utc::now().timestamp(),
    };
    state.db.create_staff(&staff)?;
    Ok((StatusCode::CREATED, Json(staff)))
}

pub async fn get_staff(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<Staff>, ApiError> {
    Ok(Json(owned_staff(&state.db, &account, &id)?))
}

pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStaffRequest>,
) -> Result<Json<Staff>, ApiError> {
    let mut staff = owned_staff(&state.db, &account, &id)?;
    if let Some(name) = req.name {
        staff.name = required("Name", &name)?;
    }
    if let Some(color) = req.color {
        if !is_valid_color(&color) {
            return Err(ApiError::BadRequest(format!("Invalid color {:?}", color)));
        }
        staff.color = color;
    }
    if let Some(active) = req.active {
        staff.active = active;
    }
    state.db.update_staff(&staff)?;
    Ok(Json(staff))
}

pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError> {
    owned_staff(&state.db, &account, &id)?;
    state.db.delete_staff(&id)?;
    tracing::info!(staff_id = %id, "Deleted staff member and their appointments");
    Ok(Json(Deleted { deleted: id }))
}
