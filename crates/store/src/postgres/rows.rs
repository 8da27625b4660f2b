//! Row types decoded by `sqlx` and their conversion into domain types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use deadline_core::{
    AlarmRule, Notification, NotificationReason, WorkOrder, WorkOrderAlarm, WorkOrderStatus,
    WorkOrderType,
};

use crate::error::StoreError;

#[derive(Debug, sqlx::FromRow)]
pub(super) struct AlarmRow {
    pub id: Uuid,
    pub work_order_id: Uuid,
    pub deadline: DateTime<Utc>,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AlarmRow> for WorkOrderAlarm {
    fn from(row: AlarmRow) -> Self {
        Self {
            id: row.id,
            work_order_id: row.work_order_id,
            deadline: row.deadline,
            last_notified_at: row.last_notified_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct NotificationRow {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub reason: String,
    pub message: String,
    pub work_order_id: Option<Uuid>,
    pub work_order_alarm_index: Option<i64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let reason = row.reason.parse::<NotificationReason>().map_err(|e| StoreError::Corrupt {
            entity: "notification",
            reason: format!("{e}"),
        })?;
        Ok(Self {
            id: row.id,
            recipient_id: row.recipient_id,
            reason,
            message: row.message,
            work_order_id: row.work_order_id,
            work_order_alarm_index: row.work_order_alarm_index,
            read: row.read,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct RuleRow {
    pub work_order_type: String,
    pub deadline_time: i32,
    pub beforehand_time: i32,
    pub deadline_reminder: String,
    pub beforehand_reminder: String,
}

impl From<RuleRow> for AlarmRule {
    fn from(row: RuleRow) -> Self {
        Self {
            work_order_type: parse_type(&row.work_order_type),
            deadline_time: row.deadline_time,
            beforehand_time: row.beforehand_time,
            deadline_reminder: row.deadline_reminder,
            beforehand_reminder: row.beforehand_reminder,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct WorkOrderRow {
    pub id: Uuid,
    pub work_order_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub responsible_uid: Uuid,
    pub name: String,
    pub code: String,
}

impl From<WorkOrderRow> for WorkOrder {
    fn from(row: WorkOrderRow) -> Self {
        Self {
            id: row.id,
            work_order_type: parse_type(&row.work_order_type),
            status: row.status.parse().unwrap_or(WorkOrderStatus::Unknown),
            created_at: row.created_at,
            finished_at: row.finished_at,
            responsible_uid: row.responsible_uid,
            name: row.name,
            code: row.code,
        }
    }
}

fn parse_type(raw: &str) -> WorkOrderType {
    raw.parse().unwrap_or(WorkOrderType::Other)
}
