pub mod appointments;
pub mod auth;
pub mod availability;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod webhooks;

use axum::Json;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::db::Database;
use crate::models::{Account, Client, Staff};

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Standard error response
#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// Look up a staff member belonging to `account`
fn owned_staff(db: &Database, account: &Account, id: &str) -> Result<Staff, ApiError> {
    db.get_staff(id)?
        .filter(|s| s.account_id == account.id)
        .ok_or(ApiError::NotFound("Staff member"))
}

/// Look up a client belonging to `account`
fn owned_client(db: &Database, account: &Account, id: &str) -> Result<Client, ApiError> {
    db.get_client(id)?
        .filter(|c| c.account_id == account.id)
        .ok_or(ApiError::NotFound("Client"))
}
