use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::handlers::ErrorResponse;
use crate::scheduling::{SchedulingError, StoreError};

impl SchedulingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SchedulingError::UnparseableDuration(_) | SchedulingError::Invalid(_) => {
                StatusCode::BAD_REQUEST
            }
            SchedulingError::OverlapDetected(_) | SchedulingError::ConcurrentConflict(_) => {
                StatusCode::CONFLICT
            }
            SchedulingError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulingError::CrossesMidnight { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SchedulingError::Datastore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SchedulingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            SchedulingError::Datastore(e) => {
                tracing::error!("Datastore failure: {:#}", e);
                "Failed to save, nothing was changed".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    Scheduling(SchedulingError),
    BadRequest(String),
    NotFound(&'static str),
    Conflict(String),
    Internal(anyhow::Error),
}

impl From<SchedulingError> for ApiError {
    fn from(e: SchedulingError) -> Self {
        ApiError::Scheduling(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(what) => ApiError::Conflict(format!("{} already exists", what)),
            StoreError::Backend(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Scheduling(e) => return e.into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
