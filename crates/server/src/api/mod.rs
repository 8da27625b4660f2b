//! Request handlers.

mod alarms;
mod events;
mod health;
mod notifications;

pub use alarms::reconcile_alarms;
pub use events::work_order_event;
pub use health::health;
pub use notifications::{
    get_notification, list_notifications, mark_all_notifications_read, mark_notification_read,
};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use deadline_core::CoreError;
use deadline_store::StoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Handler error mapped onto an HTTP status with a JSON body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    /// Server error whose message carries the whole source chain.
    pub fn internal(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        ApiError::Internal(format!("{:#}", anyhow::Error::new(e)))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        if e.is_not_found() {
            ApiError::NotFound(e.to_string())
        } else {
            tracing::error!(error = &e as &dyn std::error::Error, "store request failed");
            ApiError::internal(e)
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}
