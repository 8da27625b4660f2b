//! One reconcile pass over the due alarms.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use deadline_core::{NewNotification, NotificationReason, WorkOrder, WorkOrderAlarm};
use deadline_notify::{
    strip_labels, Delivery, MessageKind, MessageRenderer, Notifier, RenderContext,
};
use deadline_store::{DueAlarmQuery, InsertOutcome, DEFAULT_BATCH_SIZE};

use crate::days::ceil_days;
use crate::error::{AlarmError, StepError};
use crate::reconciler::ALERTING_WORK_ORDER_TYPE;
use crate::stores::AlarmStores;

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Alarms selected as due.
    pub due: usize,
    /// Notifications stored by this pass.
    pub created: usize,
    /// Alarms whose notification for the current day index was already stored.
    pub already_present: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
}

pub struct AlarmPass {
    stores: AlarmStores,
    notifier: Arc<dyn Notifier>,
    renderer: MessageRenderer,
    batch_size: u32,
}

impl AlarmPass {
    pub fn new(stores: AlarmStores, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            stores,
            notifier,
            renderer: MessageRenderer::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Process every alarm due at `now`, in deadline order.
    ///
    /// Stops at the first alarm that cannot be processed. Delivery failures
    /// are not errors.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<PassReport, AlarmError> {
        let rule = self
            .stores
            .rules
            .get_rule(ALERTING_WORK_ORDER_TYPE)
            .await
            .map_err(AlarmError::Rule)?;

        let drifted = rule.non_canonical_reminders();
        if !drifted.is_empty() {
            warn!(
                fields = ?drifted,
                "alarm rule reminder text differs from the built-in templates, which are used instead"
            );
        }

        let window = rule
            .beforehand_window()
            .map_err(|source| AlarmError::InvalidRule {
                work_order_type: rule.work_order_type,
                source,
            })?;
        let query = DueAlarmQuery::new(now, window, self.batch_size);
        let due = self
            .stores
            .alarms
            .list_due_alarms(&query)
            .await
            .map_err(AlarmError::DueAlarms)?;

        let mut report = PassReport {
            due: due.len(),
            ..PassReport::default()
        };
        if due.is_empty() {
            debug!(%now, "no due alarms");
            return Ok(report);
        }

        for alarm in &due {
            self.process(alarm, now, &mut report)
                .await
                .map_err(|source| AlarmError::Alarm {
                    alarm_id: alarm.id,
                    work_order_id: alarm.work_order_id,
                    source,
                })?;
        }

        Ok(report)
    }

    async fn process(
        &self,
        alarm: &WorkOrderAlarm,
        now: DateTime<Utc>,
        report: &mut PassReport,
    ) -> Result<(), StepError> {
        let work_order = self
            .stores
            .work_orders
            .get_work_order(alarm.work_order_id)
            .await?;

        let days = ceil_days(now, alarm.deadline);
        let kind = if now < alarm.deadline {
            MessageKind::Beforehand
        } else {
            MessageKind::DeadlinePassed
        };
        let message = self.renderer.render(
            kind,
            &RenderContext {
                name: work_order.name.clone(),
                code: work_order.code.clone(),
                days,
            },
        )?;

        if self
            .stores
            .notifications
            .alarm_notification_exists(alarm.work_order_id, days)
            .await?
        {
            debug!(
                work_order_id = %alarm.work_order_id,
                index = days,
                "notification already stored for this day, skipping"
            );
            report.already_present += 1;
        } else {
            let candidate = NewNotification {
                recipient_id: work_order.responsible_uid,
                reason: NotificationReason::DataQualityWorkOrderAlarm,
                message: message.clone(),
                work_order_id: Some(alarm.work_order_id),
                work_order_alarm_index: Some(days),
            };
            match self
                .stores
                .notifications
                .insert_notification(candidate, now)
                .await?
            {
                InsertOutcome::Inserted(notification) => {
                    info!(
                        work_order_id = %alarm.work_order_id,
                        notification_id = %notification.id,
                        index = days,
                        "alarm notification created"
                    );
                    report.created += 1;
                }
                InsertOutcome::Duplicate => {
                    debug!(
                        work_order_id = %alarm.work_order_id,
                        index = days,
                        "notification inserted concurrently, continuing"
                    );
                }
            }
            self.deliver(&work_order, &message, report).await;
        }

        self.stores.alarms.mark_notified(alarm.id, now).await?;
        Ok(())
    }

    async fn deliver(&self, work_order: &WorkOrder, message: &str, report: &mut PassReport) {
        let user_id = work_order.responsible_uid;
        let phone_number = match self.stores.users.phone_number(user_id).await {
            Ok(Some(phone)) => phone,
            Ok(None) => {
                warn!(%user_id, "recipient has no phone number, delivering without contact");
                String::new()
            }
            Err(e) => {
                warn!(
                    %user_id,
                    error = &e as &dyn std::error::Error,
                    "phone number lookup failed, delivering without contact"
                );
                String::new()
            }
        };

        let delivery = Delivery {
            phone_number,
            message: strip_labels(message),
        };
        match self.notifier.send(&delivery).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(
                    work_order_id = %work_order.id,
                    channel = self.notifier.channel_name(),
                    error = &e as &dyn std::error::Error,
                    "alarm delivery failed"
                );
                report.delivery_failures += 1;
            }
        }
    }
}
