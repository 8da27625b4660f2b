//! Due-alarm selection.

use chrono::{DateTime, Duration, Utc};

use deadline_core::WorkOrderAlarm;

/// Default number of alarms loaded per reconcile pass.
pub const DEFAULT_BATCH_SIZE: u32 = 1024;

/// Selects alarms that must be processed at `now`.
///
/// An alarm is due when either:
/// - its deadline has passed and nothing was processed since the deadline, or
/// - its deadline lies inside the beforehand window and nothing was processed
///   during the last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueAlarmQuery {
    pub now: DateTime<Utc>,
    pub beforehand_window: Duration,
    pub limit: u32,
}

impl DueAlarmQuery {
    pub fn new(now: DateTime<Utc>, beforehand_window: Duration, limit: u32) -> Self {
        Self {
            now,
            beforehand_window,
            limit,
        }
    }

    /// Upper bound (inclusive) of deadlines inside the beforehand window.
    ///
    /// Saturates at the latest representable instant.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.now
            .checked_add_signed(self.beforehand_window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Beforehand reminders repeat only when the last one is at least this old.
    pub fn renotify_cutoff(&self) -> DateTime<Utc> {
        self.now
            .checked_sub_signed(Duration::days(1))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn matches(&self, alarm: &WorkOrderAlarm) -> bool {
        let deadline_passed = alarm.deadline <= self.now
            && alarm
                .last_notified_at
                .map_or(true, |last| last < alarm.deadline);

        let in_window = self.now < alarm.deadline
            && alarm.deadline <= self.window_end()
            && alarm
                .last_notified_at
                .map_or(true, |last| last <= self.renotify_cutoff());

        deadline_passed || in_window
    }
}
