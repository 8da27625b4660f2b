//! `notifications` table: idempotent insert and the recipient inbox.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use deadline_core::{NewNotification, Notification, NotificationPage, NotificationQuery};

use super::rows::NotificationRow;
use super::{map_unique_violation, PgStore, NOTIFICATION_ALARM_KEY};
use crate::error::StoreError;
use crate::traits::{InsertOutcome, NotificationStore};

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, reason, message, work_order_id, \
     work_order_alarm_index, read, created_at, updated_at";

#[async_trait]
impl NotificationStore for PgStore {
    async fn alarm_notification_exists(
        &self,
        work_order_id: Uuid,
        work_order_alarm_index: i64,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM notifications
                WHERE work_order_id = $1 AND work_order_alarm_index = $2
             )",
        )
        .bind(work_order_id)
        .bind(work_order_alarm_index)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
        now: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError> {
        let candidate = notification.into_notification(now);
        let sql = format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, false, $7, $7)
             ON CONFLICT (work_order_id, work_order_alarm_index) DO NOTHING
             RETURNING {NOTIFICATION_COLUMNS}"
        );

        let result = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(candidate.id)
            .bind(candidate.recipient_id)
            .bind(candidate.reason.as_str())
            .bind(&candidate.message)
            .bind(candidate.work_order_id)
            .bind(candidate.work_order_alarm_index)
            .bind(now)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(row)) => Ok(InsertOutcome::Inserted(row.try_into()?)),
            Ok(None) => Ok(InsertOutcome::Duplicate),
            Err(e) => {
                let key = format!(
                    "{:?}/{:?}",
                    candidate.work_order_id, candidate.work_order_alarm_index
                );
                match map_unique_violation(e, NOTIFICATION_ALARM_KEY, "notification", key) {
                    StoreError::Duplicate { .. } => Ok(InsertOutcome::Duplicate),
                    other => Err(other),
                }
            }
        }
    }

    async fn get_notification(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE id = $1 AND recipient_id = $2"
        );
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(id)
            .bind(recipient_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Notification::try_from).transpose()
    }

    async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> Result<NotificationPage, StoreError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications
             WHERE recipient_id = $1 AND ($2::boolean IS NULL OR read = $2)",
        )
        .bind(query.recipient_id)
        .bind(query.read)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE recipient_id = $1 AND ($2::boolean IS NULL OR read = $2)
             ORDER BY created_at DESC, id
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(query.recipient_id)
            .bind(query.read)
            .bind(i64::from(query.page_size))
            .bind(query.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Notification::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NotificationPage {
            items,
            total: total.max(0) as u64,
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
        let result = sqlx::query(
            "UPDATE notifications
             SET updated_at = CASE WHEN read THEN updated_at ELSE $3 END, read = true
             WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("notification", id));
        }

        Ok(())
    }

    async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = true, updated_at = $2
             WHERE recipient_id = $1 AND read = false",
        )
        .bind(recipient_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
