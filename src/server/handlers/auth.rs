use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::crypto::{generate_api_key, hash_api_key};
use crate::models::{Account, BusinessHours};
use crate::server::middleware::AuthenticatedAccount;
use crate::server::{ApiError, AppState};

#[derive(Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub business_name: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterResponse {
    pub account_id: String,
    pub api_key: String,
}

/// Create an account and hand out its first API key
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = req.email.trim().to_lowercase();
    let business_name = req.business_name.trim();
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if business_name.is_empty() {
        return Err(ApiError::BadRequest("Business name is required".to_string()));
    }
    if state.db.get_account_by_email(&email)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "An account for {} already exists",
            email
        )));
    }

    let api_key = generate_api_key();
    let account = Account {
        id: Uuid::new_v4().to_string(),
        email,
        business_name: business_name.to_string(),
        api_key_hash: hash_api_key(&api_key)?,
        webhook_url: None,
        webhook_secret: None,
        hours: BusinessHours::default(),
        created_at: Utc::now().timestamp(),
    };
    state.db.create_account(&account)?;

    tracing::info!(account_id = %account.id, "Registered account");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account_id: account.id,
            api_key,
        }),
    ))
}

#[derive(Serialize, Deserialize)]
pub struct RotateKeyResponse {
    pub api_key: String,
}

/// Rotate API key
pub async fn rotate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
) -> Result<Json<RotateKeyResponse>, ApiError> {
    let api_key = generate_api_key();
    let api_key_hash = hash_api_key(&api_key)?;
    state
        .db
        .update_account_api_key_hash(&account.id, &api_key_hash)?;

    tracing::info!(account_id = %account.id, "Rotated API key");
    Ok(Json(RotateKeyResponse { api_key }))
}
