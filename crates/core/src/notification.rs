//! User-facing notifications and the recipient inbox query types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Largest page a recipient may request from the inbox.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Why a notification was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationReason {
    DataQualityWorkOrderAlarm,
}

impl NotificationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationReason::DataQualityWorkOrderAlarm => "data_quality_work_order_alarm",
        }
    }
}

impl fmt::Display for NotificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationReason {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data_quality_work_order_alarm" => Ok(NotificationReason::DataQualityWorkOrderAlarm),
            other => Err(CoreError::UnknownReason(other.to_string())),
        }
    }
}

/// A stored notification. Immutable apart from `read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub reason: NotificationReason,
    /// Rendered text, including `<label>` emphasis markup.
    pub message: String,
    pub work_order_id: Option<Uuid>,
    /// Day count at render time; with `work_order_id` it forms the idempotency key.
    pub work_order_alarm_index: Option<i64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A notification that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub reason: NotificationReason,
    pub message: String,
    pub work_order_id: Option<Uuid>,
    pub work_order_alarm_index: Option<i64>,
}

impl NewNotification {
    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_id: self.recipient_id,
            reason: self.reason,
            message: self.message,
            work_order_id: self.work_order_id,
            work_order_alarm_index: self.work_order_alarm_index,
            read: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Inbox listing for one recipient, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationQuery {
    pub recipient_id: Uuid,
    /// `Some(false)` lists unread only, `Some(true)` read only.
    pub read: Option<bool>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl NotificationQuery {
    pub fn new(
        recipient_id: Uuid,
        read: Option<bool>,
        page: u32,
        page_size: u32,
    ) -> Result<Self, CoreError> {
        if page == 0 {
            return Err(CoreError::InvalidPagination("page starts at 1".to_string()));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(CoreError::InvalidPagination(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self {
            recipient_id,
            read,
            page,
            page_size,
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// One page of a recipient's inbox.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
