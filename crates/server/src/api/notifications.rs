//! Recipient inbox.
//!
//! Every route is scoped by the `recipient_id` query parameter; a
//! notification belonging to someone else is reported as not found.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use deadline_core::{Notification, NotificationPage, NotificationQuery};

use super::ApiError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub recipient_id: Uuid,
    #[serde(default)]
    pub read: Option<bool>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecipientParams {
    pub recipient_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<NotificationPage>, ApiError> {
    let query =
        NotificationQuery::new(params.recipient_id, params.read, params.page, params.page_size)?;
    let page = state.stores.notifications.list_notifications(&query).await?;
    Ok(Json(page))
}

pub async fn get_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<RecipientParams>,
) -> Result<Json<Notification>, ApiError> {
    state
        .stores
        .notifications
        .get_notification(id, params.recipient_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("notification not found: {id}")))
}

pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<RecipientParams>,
) -> Result<StatusCode, ApiError> {
    state
        .stores
        .notifications
        .mark_read(id, params.recipient_id, state.clock.now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecipientParams>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = state
        .stores
        .notifications
        .mark_all_read(params.recipient_id, state.clock.now())
        .await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
