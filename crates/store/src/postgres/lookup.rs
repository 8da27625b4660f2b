//! Read-only projections: alarm rules, work orders, users.

use async_trait::async_trait;
use uuid::Uuid;

use deadline_core::{AlarmRule, WorkOrder, WorkOrderType};

use super::rows::{RuleRow, WorkOrderRow};
use super::PgStore;
use crate::error::StoreError;
use crate::traits::{AlarmRuleStore, UserStore, WorkOrderStore};

#[async_trait]
impl AlarmRuleStore for PgStore {
    async fn get_rule(&self, work_order_type: WorkOrderType) -> Result<AlarmRule, StoreError> {
        let row = sqlx::query_as::<_, RuleRow>(
            "SELECT work_order_type, deadline_time, beforehand_time,
                    deadline_reminder, beforehand_reminder
             FROM alarm_rules
             WHERE work_order_type = $1",
        )
        .bind(work_order_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AlarmRule::from)
            .ok_or_else(|| StoreError::not_found("alarm rule", work_order_type))
    }
}

#[async_trait]
impl WorkOrderStore for PgStore {
    async fn get_work_order(&self, id: Uuid) -> Result<WorkOrder, StoreError> {
        let row = sqlx::query_as::<_, WorkOrderRow>(
            "SELECT id, work_order_type, status, created_at, finished_at,
                    responsible_uid, name, code
             FROM work_orders
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkOrder::from)
            .ok_or_else(|| StoreError::not_found("work order", id))
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn phone_number(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        let phone = sqlx::query_scalar::<_, Option<String>>(
            "SELECT phone_number FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(phone.flatten().filter(|p| !p.is_empty()))
    }
}
