use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use deadline_alarm::PassReport;

use super::ApiError;
use crate::state::AppState;

/// Run one pass now, queued behind any scheduled pass in progress.
pub async fn reconcile_alarms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PassReport>, ApiError> {
    let report = state.controller.reconcile().await.map_err(|e| {
        tracing::error!(error = &e as &dyn std::error::Error, "manual alarm pass failed");
        ApiError::internal(e)
    })?;
    tracing::info!(
        due = report.due,
        created = report.created,
        delivery_failures = report.delivery_failures,
        "manual alarm pass finished"
    );
    Ok(Json(report))
}
