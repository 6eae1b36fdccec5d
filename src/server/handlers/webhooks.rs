use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::crypto::generate_webhook_secret;
use crate::models::{AppointmentStatus, Account};
use crate::server::middleware::AuthenticatedAccount;
use crate::server::{ApiError, AppState};
use crate::webhook::{WebhookEvent, WebhookEventData, WebhookEventType};

#[derive(Serialize, Deserialize)]
pub struct RegisterWebhookRequest {
    pub url: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterWebhookResponse {
    pub url: String,
    pub secret: String,
}

/// Register or update webhook URL
pub async fn register_webhook(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Json(req): Json<RegisterWebhookRequest>,
) -> Result<Json<RegisterWebhookResponse>, ApiError> {
    url::Url::parse(&req.url).map_err(|e| ApiError::BadRequest(format!("Invalid URL: {}", e)))?;

    let secret = generate_webhook_secret();
    state
        .db
        .update_account_webhook(&account.id, Some(&req.url), Some(&secret))?;

    Ok(Json(RegisterWebhookResponse {
        url: req.url,
        secret,
    }))
}

/// Remove webhook
pub async fn remove_webhook(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.update_account_webhook(&account.id, None, None)?;
    Ok(Json(serde_json::json!({ "status": "removed" })))
}

#[derive(Serialize, Deserialize)]
pub struct TestWebhookResponse {
    pub success: bool,
    pub error: Option<String>,
}

/// Deliver a sample event synchronously and report the outcome
pub async fn test_webhook(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
) -> Result<Json<TestWebhookResponse>, ApiError> {
    let (webhook_url, webhook_secret) = match (&account.webhook_url, &account.webhook_secret) {
        (Some(url), Some(secret)) => (url, secret),
        _ => return Err(ApiError::BadRequest("No webhook configured".to_string())),
    };

    let event = WebhookEvent::new(WebhookEventType::Test, sample_data(&account));
    Ok(Json(
        match state
            .webhooks
            .deliver(webhook_url, webhook_secret, &event)
            .await
        {
            Ok(()) => TestWebhookResponse {
                success: true,
                error: None,
            },
            Err(e) => TestWebhookResponse {
                success: false,
                error: Some(format!("{:#}", e)),
            },
        },
    ))
}

fn sample_data(account: &Account) -> WebhookEventData {
    WebhookEventData {
        appointment_id: "apt_test".to_string(),
        client_id: "client_test".to_string(),
        staff_id: "staff_test".to_string(),
        service_ids: vec![],
        date: Local::now().date_naive(),
        start_time: account.hours.opening,
        end_time: account.hours.opening,
        status: AppointmentStatus::Pending,
        price_cents: 0,
        previous_date: None,
        previous_start_time: None,
    }
}
