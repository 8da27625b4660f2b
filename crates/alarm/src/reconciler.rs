//! Keeps the alarm table in step with work-order lifecycle events.

use std::sync::Arc;

use tracing::{debug, info, warn};

use deadline_core::{WorkOrder, WorkOrderAlarm, WorkOrderEvent, WorkOrderEventKind, WorkOrderType};
use deadline_store::{AlarmRuleStore, WorkOrderAlarmStore};

use crate::clock::Clock;
use crate::error::ReconcileError;
use crate::stores::AlarmStores;

/// The only work-order type that gets deadline alarms.
pub const ALERTING_WORK_ORDER_TYPE: WorkOrderType = WorkOrderType::DataQuality;

pub struct WorkOrderReconciler {
    rules: Arc<dyn AlarmRuleStore>,
    alarms: Arc<dyn WorkOrderAlarmStore>,
    clock: Arc<dyn Clock>,
}

impl WorkOrderReconciler {
    pub fn new(stores: &AlarmStores, clock: Arc<dyn Clock>) -> Self {
        Self {
            rules: stores.rules.clone(),
            alarms: stores.alarms.clone(),
            clock,
        }
    }

    /// Apply one lifecycle event.
    ///
    /// A second Added for the same work order fails with an error whose
    /// [`ReconcileError::is_redelivery`] is true; callers decide whether
    /// that is worth surfacing.
    pub async fn reconcile(&self, event: &WorkOrderEvent) -> Result<(), ReconcileError> {
        let work_order = &event.resource;
        if work_order.work_order_type != ALERTING_WORK_ORDER_TYPE {
            debug!(
                work_order_id = %work_order.id,
                work_order_type = %work_order.work_order_type,
                "ignoring event for non-alerting work order type"
            );
            return Ok(());
        }

        match event.kind {
            WorkOrderEventKind::Added => self.create(work_order).await,
            WorkOrderEventKind::Modified if work_order.is_finished() => {
                self.remove(work_order, "finished").await
            }
            WorkOrderEventKind::Modified => Ok(()),
            WorkOrderEventKind::Deleted => self.remove(work_order, "deleted").await,
            WorkOrderEventKind::Unknown => {
                warn!(work_order_id = %work_order.id, "ignoring work order event of unknown kind");
                Ok(())
            }
        }
    }

    async fn create(&self, work_order: &WorkOrder) -> Result<(), ReconcileError> {
        if work_order.is_finished() {
            debug!(work_order_id = %work_order.id, "work order added already finished, no alarm");
            return Ok(());
        }

        let rule = self
            .rules
            .get_rule(work_order.work_order_type)
            .await
            .map_err(ReconcileError::Rule)?;

        let deadline = rule
            .deadline_for(work_order.created_at)
            .map_err(|source| ReconcileError::InvalidRule {
                work_order_type: rule.work_order_type,
                work_order_id: work_order.id,
                source,
            })?;
        let alarm = WorkOrderAlarm::new(work_order.id, deadline, self.clock.now());
        self.alarms
            .create_alarm(&alarm)
            .await
            .map_err(|source| ReconcileError::Alarm {
                work_order_id: work_order.id,
                source,
            })?;

        info!(
            work_order_id = %work_order.id,
            alarm_id = %alarm.id,
            %deadline,
            "work order alarm created"
        );
        Ok(())
    }

    async fn remove(&self, work_order: &WorkOrder, why: &str) -> Result<(), ReconcileError> {
        let removed = self
            .alarms
            .delete_alarm_by_work_order(work_order.id)
            .await
            .map_err(|source| ReconcileError::Alarm {
                work_order_id: work_order.id,
                source,
            })?;

        if removed {
            info!(work_order_id = %work_order.id, reason = why, "work order alarm removed");
        } else {
            debug!(work_order_id = %work_order.id, reason = why, "no alarm to remove");
        }
        Ok(())
    }
}
