//! Work-order lifecycle events pushed by the work-order service.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use deadline_core::WorkOrderEvent;

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EventAck {
    /// "applied", or "duplicate" for a redelivered Added event.
    pub status: &'static str,
}

pub async fn work_order_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<WorkOrderEvent>,
) -> Result<Json<EventAck>, ApiError> {
    match state.reconciler.reconcile(&event).await {
        Ok(()) => Ok(Json(EventAck { status: "applied" })),
        Err(e) if e.is_redelivery() => {
            info!(work_order_id = %event.resource.id, "work order event redelivered, alarm already exists");
            Ok(Json(EventAck { status: "duplicate" }))
        }
        Err(e) => {
            tracing::error!(
                work_order_id = %event.resource.id,
                kind = %event.kind,
                error = &e as &dyn std::error::Error,
                "work order event failed"
            );
            Err(ApiError::internal(e))
        }
    }
}
