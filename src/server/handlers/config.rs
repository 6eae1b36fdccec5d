use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::crypto::generate_webhook_secret;
use crate::models::{hhmm_opt, AccountInfo, BusinessHours};
use crate::server::middleware::AuthenticatedAccount;
use crate::server::{ApiError, AppState};

/// Get current account settings
pub async fn get_config(
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
) -> Json<AccountInfo> {
    Json(account.into())
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateConfigRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hhmm_opt")]
    pub opening: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hhmm_opt")]
    pub closing: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_minutes: Option<u32>,
    /// Empty string removes the webhook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct UpdateConfigResponse {
    #[serde(flatten)]
    pub account: AccountInfo,
    /// Present only when a new webhook secret was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

/// Update account settings
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(mut account)): Extension<AuthenticatedAccount>,
    Json(req): Json<UpdateConfigRequest>,
) -> Result<Json<UpdateConfigResponse>, ApiError> {
    let hours = BusinessHours {
        opening: req.opening.unwrap_or(account.hours.opening),
        closing: req.closing.unwrap_or(account.hours.closing),
        slot_minutes: req.slot_minutes.unwrap_or(account.hours.slot_minutes),
    };
    hours.validate().map_err(ApiError::BadRequest)?;

    let business_name = match req.business_name {
        Some(name) if name.trim().is_empty() => {
            return Err(ApiError::BadRequest("Business name is required".to_string()))
        }
        Some(name) => name.trim().to_string(),
        None => account.business_name.clone(),
    };

    let mut new_secret = None;
    if let Some(webhook_url) = req.webhook_url {
        let (url, secret) = if webhook_url.is_empty() {
            (None, None)
        } else {
            url::Url::parse(&webhook_url)
                .map_err(|e| ApiError::BadRequest(format!("Invalid URL: {}", e)))?;
            // A new URL always gets a new secret
            (Some(webhook_url), Some(generate_webhook_secret()))
        };
        state
            .db
            .update_account_webhook(&account.id, url.as_deref(), secret.as_deref())?;
        account.webhook_url = url;
        new_secret = secret;
    }

    state
        .db
        .update_account_settings(&account.id, &business_name, &hours)?;
    account.business_name = business_name;
    account.hours = hours;

    Ok(Json(UpdateConfigResponse {
        account: account.into(),
        webhook_secret: new_secret,
    }))
}
