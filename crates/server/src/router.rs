//! HTTP router construction.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::api;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/work-orders/events", post(api::work_order_event))
        .route("/alarms/reconcile", post(api::reconcile_alarms))
        .route("/notifications", get(api::list_notifications))
        .route("/notifications/read-all", post(api::mark_all_notifications_read))
        .route("/notifications/{id}", get(api::get_notification))
        .route("/notifications/{id}/read", post(api::mark_notification_read))
        .with_state(state)
}
