//! `work_order_alarms` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use deadline_core::WorkOrderAlarm;

use super::rows::AlarmRow;
use super::{map_unique_violation, PgStore, ALARM_WORK_ORDER_KEY};
use crate::error::StoreError;
use crate::query::DueAlarmQuery;
use crate::traits::WorkOrderAlarmStore;

#[async_trait]
impl WorkOrderAlarmStore for PgStore {
    async fn create_alarm(&self, alarm: &WorkOrderAlarm) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO work_order_alarms
                (id, work_order_id, deadline, last_notified_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(alarm.id)
        .bind(alarm.work_order_id)
        .bind(alarm.deadline)
        .bind(alarm.last_notified_at)
        .bind(alarm.created_at)
        .bind(alarm.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, ALARM_WORK_ORDER_KEY, "work order alarm", alarm.work_order_id)
        })?;

        Ok(())
    }

    async fn get_alarm_by_work_order(
        &self,
        work_order_id: Uuid,
    ) -> Result<Option<WorkOrderAlarm>, StoreError> {
        let row = sqlx::query_as::<_, AlarmRow>(
            "SELECT id, work_order_id, deadline, last_notified_at, created_at, updated_at
             FROM work_order_alarms
             WHERE work_order_id = $1",
        )
        .bind(work_order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(WorkOrderAlarm::from))
    }

    async fn delete_alarm_by_work_order(&self, work_order_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM work_order_alarms WHERE work_order_id = $1")
            .bind(work_order_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_due_alarms(
        &self,
        query: &DueAlarmQuery,
    ) -> Result<Vec<WorkOrderAlarm>, StoreError> {
        // Mirrors DueAlarmQuery::matches.
        let rows = sqlx::query_as::<_, AlarmRow>(
            "SELECT id, work_order_id, deadline, last_notified_at, created_at, updated_at
             FROM work_order_alarms
             WHERE (deadline <= $1
                    AND (last_notified_at IS NULL OR last_notified_at < deadline))
                OR ($1 < deadline AND deadline <= $2
                    AND (last_notified_at IS NULL OR last_notified_at <= $3))
             ORDER BY deadline
             LIMIT $4",
        )
        .bind(query.now)
        .bind(query.window_end())
        .bind(query.renotify_cutoff())
        .bind(i64::from(query.limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WorkOrderAlarm::from).collect())
    }

    async fn mark_notified(&self, alarm_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE work_order_alarms SET last_notified_at = $2, updated_at = $2 WHERE id = $1",
        )
        .bind(alarm_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("work order alarm", alarm_id));
        }

        Ok(())
    }
}
