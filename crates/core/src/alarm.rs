use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::work_order::WorkOrderType;

/// Largest day offset a rule may carry for either threshold.
pub const MAX_RULE_DAYS: i32 = 36_500;

/// Reminder text operators are expected to store for the beforehand window.
pub const CANONICAL_BEFOREHAND_REMINDER: &str =
    "Work order {name} ({code}) is due in {days} days";

/// Reminder text operators are expected to store for a passed deadline.
pub const CANONICAL_DEADLINE_REMINDER: &str = "Work order {name} ({code}) has passed its deadline";

/// Deadline tracking for one active work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderAlarm {
    pub id: Uuid,
    pub work_order_id: Uuid,
    /// Work-order creation time plus the rule's deadline offset; fixed at creation.
    pub deadline: DateTime<Utc>,
    /// Last time any notification was processed for this alarm.
    pub last_notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkOrderAlarm {
    /// Build a fresh alarm with a new identifier.
    pub fn new(work_order_id: Uuid, deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            work_order_id,
            deadline,
            last_notified_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Alarm thresholds configured per work-order type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmRule {
    pub work_order_type: WorkOrderType,
    /// Days from work-order creation to its deadline.
    pub deadline_time: i32,
    /// Width in days of the reminder window before the deadline.
    pub beforehand_time: i32,
    pub deadline_reminder: String,
    pub beforehand_reminder: String,
}

impl AlarmRule {
    pub fn deadline_for(&self, created_at: DateTime<Utc>) -> Result<DateTime<Utc>, CoreError> {
        let offset = rule_days("deadline_time", self.deadline_time)?;
        created_at.checked_add_signed(offset).ok_or_else(|| {
            CoreError::InvalidRule(format!(
                "deadline_time {} overflows creation time {created_at}",
                self.deadline_time
            ))
        })
    }

    pub fn beforehand_window(&self) -> Result<Duration, CoreError> {
        rule_days("beforehand_time", self.beforehand_time)
    }

    /// Names of the reminder fields whose text differs from the canonical form.
    ///
    /// The texts are never used for rendering; a mismatch only means the
    /// stored rule and the built-in templates have drifted apart.
    pub fn non_canonical_reminders(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.beforehand_reminder.trim() != CANONICAL_BEFOREHAND_REMINDER {
            fields.push("beforehand_reminder");
        }
        if self.deadline_reminder.trim() != CANONICAL_DEADLINE_REMINDER {
            fields.push("deadline_reminder");
        }
        fields
    }
}

fn rule_days(field: &str, days: i32) -> Result<Duration, CoreError> {
    if !(0..=MAX_RULE_DAYS).contains(&days) {
        return Err(CoreError::InvalidRule(format!(
            "{field} must be between 0 and {MAX_RULE_DAYS} days, got {days}"
        )));
    }
    Duration::try_days(i64::from(days))
        .ok_or_else(|| CoreError::InvalidRule(format!("{field} of {days} days is out of range")))
}
