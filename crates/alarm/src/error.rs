use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use deadline_core::{CoreError, WorkOrderType};
use deadline_notify::NotifyError;
use deadline_store::StoreError;

/// Failure while applying a work-order lifecycle event.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("loading alarm rule")]
    Rule(#[source] StoreError),

    #[error("alarm rule for {work_order_type} cannot place a deadline for work order {work_order_id}")]
    InvalidRule {
        work_order_type: WorkOrderType,
        work_order_id: Uuid,
        #[source]
        source: CoreError,
    },

    #[error("updating alarm for work order {work_order_id}")]
    Alarm {
        work_order_id: Uuid,
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    /// True when an Added event hit an existing alarm, i.e. the event was
    /// delivered more than once.
    pub fn is_redelivery(&self) -> bool {
        matches!(self, Self::Alarm { source, .. } if source.is_duplicate())
    }
}

/// Failure of a single alarm inside a pass.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] NotifyError),
}

/// A reconcile pass stopped early. Alarms processed before the failure
/// keep their updates; the rest are retried on the next pass.
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("loading alarm rule")]
    Rule(#[source] StoreError),

    #[error("alarm rule for {work_order_type} has an unusable beforehand window")]
    InvalidRule {
        work_order_type: WorkOrderType,
        #[source]
        source: CoreError,
    },

    #[error("listing due alarms")]
    DueAlarms(#[source] StoreError),

    #[error("processing alarm {alarm_id} of work order {work_order_id}")]
    Alarm {
        alarm_id: Uuid,
        work_order_id: Uuid,
        #[source]
        source: StepError,
    },
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("alarm controller is already running")]
    AlreadyRunning,

    #[error("alarm controller did not stop within {0:?}")]
    StopTimeout(Duration),

    #[error("alarm controller task failed")]
    Join(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn context_messages_leave_the_cause_to_the_source_chain() {
        let err = AlarmError::Alarm {
            alarm_id: Uuid::new_v4(),
            work_order_id: Uuid::new_v4(),
            source: StepError::Store(StoreError::not_found("work order", "wo-1")),
        };
        let cause = err.source().map(ToString::to_string).unwrap();
        assert_eq!(cause, "work order not found: wo-1");
        assert!(!err.to_string().contains(&cause));

        let err = ReconcileError::Rule(StoreError::not_found("alarm rule", "data_quality"));
        assert_eq!(err.to_string(), "loading alarm rule");
    }
}
