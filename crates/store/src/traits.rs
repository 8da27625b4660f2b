//! Store trait definitions.
//!
//! The alarm engine only ever talks to these traits, so the same reconcile
//! logic runs against [`MemoryStore`](crate::MemoryStore) in tests and
//! [`PgStore`](crate::PgStore) in production.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use deadline_core::{
    AlarmRule, NewNotification, Notification, NotificationPage, NotificationQuery, WorkOrder,
    WorkOrderAlarm, WorkOrderType,
};

use crate::error::StoreError;
use crate::query::DueAlarmQuery;

/// Read-only lookup of alarm thresholds by work-order type.
#[async_trait]
pub trait AlarmRuleStore: Send + Sync {
    async fn get_rule(&self, work_order_type: WorkOrderType) -> Result<AlarmRule, StoreError>;
}

/// Read-only work-order projection.
#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    async fn get_work_order(&self, id: Uuid) -> Result<WorkOrder, StoreError>;
}

/// Read-only user projection.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Phone number of a user, `None` when unknown or not set.
    async fn phone_number(&self, user_id: Uuid) -> Result<Option<String>, StoreError>;
}

#[async_trait]
pub trait WorkOrderAlarmStore: Send + Sync {
    /// Insert a new alarm. Fails with [`StoreError::Duplicate`] when the work
    /// order already has one.
    async fn create_alarm(&self, alarm: &WorkOrderAlarm) -> Result<(), StoreError>;

    async fn get_alarm_by_work_order(
        &self,
        work_order_id: Uuid,
    ) -> Result<Option<WorkOrderAlarm>, StoreError>;

    /// Remove the alarm of a work order. Returns whether a row was removed.
    async fn delete_alarm_by_work_order(&self, work_order_id: Uuid) -> Result<bool, StoreError>;

    /// Alarms matching [`DueAlarmQuery::matches`], ordered by deadline,
    /// at most `query.limit` of them.
    async fn list_due_alarms(&self, query: &DueAlarmQuery)
        -> Result<Vec<WorkOrderAlarm>, StoreError>;

    async fn mark_notified(&self, alarm_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Result of an insert-if-absent on the notification idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Notification),
    /// A row with the same (`work_order_id`, `work_order_alarm_index`) exists.
    Duplicate,
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn alarm_notification_exists(
        &self,
        work_order_id: Uuid,
        work_order_alarm_index: i64,
    ) -> Result<bool, StoreError>;

    /// Insert unless the idempotency key is already taken. Notifications
    /// without a work-order key are always inserted.
    async fn insert_notification(
        &self,
        notification: NewNotification,
        now: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError>;

    async fn get_notification(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>, StoreError>;

    async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> Result<NotificationPage, StoreError>;

    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Mark every unread notification of a recipient as read; returns the count.
    async fn mark_all_read(&self, recipient_id: Uuid, now: DateTime<Utc>)
        -> Result<u64, StoreError>;
}
