//! In-process implementation of every store trait.
//!
//! Used when PostgreSQL is not configured and as the fake in tests. It
//! enforces the same unique keys as the SQL schema: one alarm per work order
//! and one notification per (`work_order_id`, `work_order_alarm_index`).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use deadline_core::{
    AlarmRule, NewNotification, Notification, NotificationPage, NotificationQuery, WorkOrder,
    WorkOrderAlarm, WorkOrderType,
};

use crate::error::StoreError;
use crate::query::DueAlarmQuery;
use crate::traits::{
    AlarmRuleStore, InsertOutcome, NotificationStore, UserStore, WorkOrderAlarmStore,
    WorkOrderStore,
};

#[derive(Default)]
struct Inner {
    rules: HashMap<WorkOrderType, AlarmRule>,
    work_orders: HashMap<Uuid, WorkOrder>,
    phone_numbers: HashMap<Uuid, Option<String>>,
    /// Keyed by work-order id, which is unique per alarm.
    alarms: HashMap<Uuid, WorkOrderAlarm>,
    notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_rule(&self, rule: AlarmRule) {
        let mut inner = self.inner.write().await;
        inner.rules.insert(rule.work_order_type, rule);
    }

    pub async fn put_work_order(&self, work_order: WorkOrder) {
        let mut inner = self.inner.write().await;
        inner.work_orders.insert(work_order.id, work_order);
    }

    pub async fn put_user(&self, user_id: Uuid, phone_number: Option<String>) {
        let mut inner = self.inner.write().await;
        inner.phone_numbers.insert(user_id, phone_number);
    }

    /// All stored alarms, ordered by deadline.
    pub async fn alarms(&self) -> Vec<WorkOrderAlarm> {
        let inner = self.inner.read().await;
        let mut alarms: Vec<_> = inner.alarms.values().cloned().collect();
        alarms.sort_by_key(|a| a.deadline);
        alarms
    }

    /// All stored notifications in insertion order.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner.read().await.notifications.clone()
    }
}

#[async_trait]
impl AlarmRuleStore for MemoryStore {
    async fn get_rule(&self, work_order_type: WorkOrderType) -> Result<AlarmRule, StoreError> {
        self.inner
            .read()
            .await
            .rules
            .get(&work_order_type)
            .cloned()
            .ok_or_else(|| StoreError::not_found("alarm rule", work_order_type))
    }
}

#[async_trait]
impl WorkOrderStore for MemoryStore {
    async fn get_work_order(&self, id: Uuid) -> Result<WorkOrder, StoreError> {
        self.inner
            .read()
            .await
            .work_orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("work order", id))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn phone_number(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.phone_numbers.get(&user_id).cloned().flatten())
    }
}

#[async_trait]
impl WorkOrderAlarmStore for MemoryStore {
    async fn create_alarm(&self, alarm: &WorkOrderAlarm) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.alarms.contains_key(&alarm.work_order_id) {
            return Err(StoreError::duplicate("work order alarm", alarm.work_order_id));
        }
        inner.alarms.insert(alarm.work_order_id, alarm.clone());
        Ok(())
    }

    async fn get_alarm_by_work_order(
        &self,
        work_order_id: Uuid,
    ) -> Result<Option<WorkOrderAlarm>, StoreError> {
        Ok(self.inner.read().await.alarms.get(&work_order_id).cloned())
    }

    async fn delete_alarm_by_work_order(&self, work_order_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .write()
            .await
            .alarms
            .remove(&work_order_id)
            .is_some())
    }

    async fn list_due_alarms(
        &self,
        query: &DueAlarmQuery,
    ) -> Result<Vec<WorkOrderAlarm>, StoreError> {
        let inner = self.inner.read().await;
        let mut due: Vec<_> = inner
            .alarms
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        due.sort_by_key(|a| a.deadline);
        due.truncate(query.limit as usize);
        Ok(due)
    }

    async fn mark_notified(&self, alarm_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let alarm = inner
            .alarms
            .values_mut()
            .find(|a| a.id == alarm_id)
            .ok_or_else(|| StoreError::not_found("work order alarm", alarm_id))?;
        alarm.last_notified_at = Some(at);
        alarm.updated_at = at;
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn alarm_notification_exists(
        &self,
        work_order_id: Uuid,
        work_order_alarm_index: i64,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.notifications.iter().any(|n| {
            n.work_order_id == Some(work_order_id)
                && n.work_order_alarm_index == Some(work_order_alarm_index)
        }))
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
        now: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        if let (Some(work_order_id), Some(index)) =
            (notification.work_order_id, notification.work_order_alarm_index)
        {
            let taken = inner.notifications.iter().any(|n| {
                n.work_order_id == Some(work_order_id) && n.work_order_alarm_index == Some(index)
            });
            if taken {
                return Ok(InsertOutcome::Duplicate);
            }
        }
        let stored = notification.into_notification(now);
        inner.notifications.push(stored.clone());
        Ok(InsertOutcome::Inserted(stored))
    }

    async fn get_notification(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .notifications
            .iter()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
            .cloned())
    }

    async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> Result<NotificationPage, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<_> = inner
            .notifications
            .iter()
            .filter(|n| n.recipient_id == query.recipient_id)
            .filter(|n| query.read.map_or(true, |read| n.read == read))
            .cloned()
            .collect();
        // Insertion order breaks ties between equal timestamps: newest first.
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();

        Ok(NotificationPage {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let notification = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
            .ok_or_else(|| StoreError::not_found("notification", id))?;
        if !notification.read {
            notification.read = true;
            notification.updated_at = now;
        }
        Ok(())
    }

    async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let mut count = 0;
        for n in inner
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.read)
        {
            n.read = true;
            n.updated_at = now;
            count += 1;
        }
        Ok(count)
    }
}
