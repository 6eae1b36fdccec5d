use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use std::sync::Arc;

use super::AppState;
use crate::models::Account;

/// Extension for the authenticated account
#[derive(Clone)]
pub struct AuthenticatedAccount(pub Account);

/// API key authentication middleware
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let account = state
        .db
        .find_account_by_api_key(api_key.token())
        .map_err(|e| {
            tracing::error!("Failed to look up API key: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthenticatedAccount(account));

    Ok(next.run(request).await)
}
