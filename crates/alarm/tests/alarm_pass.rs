//! Reconcile passes against the in-memory store.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use deadline_alarm::{AlarmError, AlarmStores, AlarmPass, PassReport, StepError};
use deadline_core::{
    NewNotification, Notification, NotificationPage, NotificationQuery, NotificationReason,
    WorkOrderAlarm, WorkOrderEvent, WorkOrderEventKind, WorkOrderStatus,
};
use deadline_store::{
    InsertOutcome, MemoryStore, NotificationStore, StoreError, WorkOrderAlarmStore,
};

use common::{data_quality_rule, t0, work_order, FailingNotifier, Harness, RecordingNotifier, PHONE};

async fn add(h: &Harness, wo: &deadline_core::WorkOrder) {
    h.reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Added, wo.clone()))
        .await
        .unwrap();
}

#[tokio::test]
async fn reminders_then_single_deadline_notification() {
    let h = Harness::new().await;
    let wo = h.seed_work_order().await;
    add(&h, &wo).await;
    let notifier = Arc::new(RecordingNotifier::default());
    let pass = h.pass(notifier.clone());

    // Outside the three-day window.
    let report = pass.run(t0() + Duration::days(6)).await.unwrap();
    assert_eq!(report, PassReport::default());

    let report = pass.run(t0() + Duration::days(8)).await.unwrap();
    assert_eq!(report.due, 1);
    assert_eq!(report.created, 1);
    assert_eq!(report.delivered, 1);

    let stored = h.store.notifications().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].work_order_alarm_index, Some(2));
    assert_eq!(stored[0].work_order_id, Some(wo.id));
    assert_eq!(stored[0].recipient_id, wo.responsible_uid);
    assert_eq!(stored[0].reason, NotificationReason::DataQualityWorkOrderAlarm);
    assert!(stored[0].message.contains("<label>2</label>"));

    let deliveries = notifier.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].phone_number, PHONE);
    assert_eq!(
        deliveries[0].message,
        "Data quality work order Orders table null check (WO-0042) has 2 days remaining before its deadline."
    );

    // Less than a day since the last reminder.
    let report = pass.run(t0() + Duration::days(8) + Duration::hours(12)).await.unwrap();
    assert_eq!(report.due, 0);

    let report = pass.run(t0() + Duration::days(9)).await.unwrap();
    assert_eq!(report.created, 1);

    let passed = t0() + Duration::days(10) + Duration::seconds(1);
    let report = pass.run(passed).await.unwrap();
    assert_eq!(report.created, 1);
    for later in [passed + Duration::hours(1), passed + Duration::days(5)] {
        assert_eq!(pass.run(later).await.unwrap().due, 0);
    }

    let indexes: Vec<_> = h
        .store
        .notifications()
        .await
        .iter()
        .map(|n| n.work_order_alarm_index)
        .collect();
    assert_eq!(indexes, vec![Some(2), Some(1), Some(0)]);

    let deliveries = notifier.deliveries();
    assert_eq!(deliveries.len(), 3);
    assert_eq!(
        deliveries[2].message,
        "Data quality work order Orders table null check (WO-0042) has passed its deadline."
    );

    let alarm = h.store.alarms().await.remove(0);
    assert_eq!(alarm.last_notified_at, Some(passed));
}

#[tokio::test]
async fn finished_work_order_is_never_notified() {
    let h = Harness::new().await;
    let mut wo = h.seed_work_order().await;
    add(&h, &wo).await;

    wo.status = WorkOrderStatus::Finished;
    h.reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Modified, wo))
        .await
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let pass = h.pass(notifier.clone());
    for days in [8, 9, 11] {
        assert_eq!(pass.run(t0() + Duration::days(days)).await.unwrap().due, 0);
    }
    assert!(h.store.notifications().await.is_empty());
    assert!(notifier.deliveries().is_empty());
}

/// Answers every existence check with "absent", as a check that raced with
/// another writer would.
struct StaleExistenceCheck(Arc<MemoryStore>);

#[async_trait::async_trait]
impl NotificationStore for StaleExistenceCheck {
    async fn alarm_notification_exists(&self, _: Uuid, _: i64) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
        now: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError> {
        self.0.insert_notification(notification, now).await
    }

    async fn get_notification(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        self.0.get_notification(id, recipient_id).await
    }

    async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> Result<NotificationPage, StoreError> {
        self.0.list_notifications(query).await
    }

    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.0.mark_read(id, recipient_id, now).await
    }

    async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.0.mark_all_read(recipient_id, now).await
    }
}

fn alarm_notification(wo: &deadline_core::WorkOrder, index: i64) -> NewNotification {
    NewNotification {
        recipient_id: wo.responsible_uid,
        reason: NotificationReason::DataQualityWorkOrderAlarm,
        message: "stored by a concurrent pass".to_string(),
        work_order_id: Some(wo.id),
        work_order_alarm_index: Some(index),
    }
}

#[tokio::test]
async fn notification_inserted_concurrently_is_not_duplicated() {
    let h = Harness::new().await;
    let wo = h.seed_work_order().await;
    add(&h, &wo).await;
    let now = t0() + Duration::days(8);
    h.store
        .insert_notification(alarm_notification(&wo, 2), now - Duration::minutes(1))
        .await
        .unwrap();

    let stores = AlarmStores {
        notifications: Arc::new(StaleExistenceCheck(h.store.clone())),
        ..h.stores.clone()
    };
    let notifier = Arc::new(RecordingNotifier::default());
    let report = AlarmPass::new(stores, notifier.clone()).run(now).await.unwrap();

    assert_eq!(report.due, 1);
    assert_eq!(report.created, 0);
    assert_eq!(report.delivered, 1);
    assert_eq!(notifier.deliveries().len(), 1);
    let stored = h.store.notifications().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].message, "stored by a concurrent pass");

    let alarm = h.store.get_alarm_by_work_order(wo.id).await.unwrap().unwrap();
    assert_eq!(alarm.last_notified_at, Some(now));
}

#[tokio::test]
async fn oversized_beforehand_window_fails_the_pass() {
    let h = Harness::new().await;
    let wo = h.seed_work_order().await;
    add(&h, &wo).await;
    h.store.put_rule(data_quality_rule(10, 200_000_000)).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let err = h
        .pass(notifier.clone())
        .run(t0() + Duration::days(8))
        .await
        .unwrap_err();

    assert!(matches!(err, AlarmError::InvalidRule { .. }), "got: {err:?}");
    assert!(h.store.notifications().await.is_empty());
    assert!(notifier.deliveries().is_empty());
}

#[tokio::test]
async fn existing_notification_is_not_recreated_or_redelivered() {
    let h = Harness::new().await;
    let wo = h.seed_work_order().await;
    add(&h, &wo).await;
    let now = t0() + Duration::days(8);

    h.store
        .insert_notification(alarm_notification(&wo, 2), now)
        .await
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let report = h.pass(notifier.clone()).run(now).await.unwrap();

    assert_eq!(report.due, 1);
    assert_eq!(report.created, 0);
    assert_eq!(report.already_present, 1);
    assert!(notifier.deliveries().is_empty());
    assert_eq!(h.store.notifications().await.len(), 1);

    let alarm = h.store.get_alarm_by_work_order(wo.id).await.unwrap().unwrap();
    assert_eq!(alarm.last_notified_at, Some(now));
}

#[tokio::test]
async fn delivery_failure_still_advances_alarm() {
    let h = Harness::new().await;
    let wo = h.seed_work_order().await;
    add(&h, &wo).await;
    let now = t0() + Duration::days(8);

    let notifier = Arc::new(FailingNotifier::default());
    let pass = h.pass(notifier.clone());
    let report = pass.run(now).await.unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.delivery_failures, 1);
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.notifications().await.len(), 1);

    // Not retried: the alarm counts as notified.
    assert_eq!(pass.run(now + Duration::hours(1)).await.unwrap().due, 0);
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn recipient_without_phone_gets_empty_contact() {
    let h = Harness::new().await;
    let owner = Uuid::new_v4();
    h.store.put_user(owner, None).await;
    let wo = work_order(t0(), owner);
    h.store.put_work_order(wo.clone()).await;
    add(&h, &wo).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let report = h.pass(notifier.clone()).run(t0() + Duration::days(8)).await.unwrap();

    assert_eq!(report.delivered, 1);
    let deliveries = notifier.deliveries();
    assert_eq!(deliveries[0].phone_number, "");
    assert!(deliveries[0].message.contains("2 days remaining"));
}

#[tokio::test]
async fn missing_work_order_aborts_the_pass() {
    let h = Harness::new().await;
    let orphan = WorkOrderAlarm::new(Uuid::new_v4(), t0() + Duration::days(9), t0());
    h.store.create_alarm(&orphan).await.unwrap();
    let wo = h.seed_work_order().await;
    add(&h, &wo).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let err = h
        .pass(notifier.clone())
        .run(t0() + Duration::days(8))
        .await
        .unwrap_err();

    match err {
        AlarmError::Alarm {
            work_order_id,
            source: StepError::Store(store_err),
            ..
        } => {
            assert_eq!(work_order_id, orphan.work_order_id);
            assert!(store_err.is_not_found());
        }
        other => panic!("expected alarm error, got: {other:?}"),
    }

    // Later alarms in the batch were not reached.
    assert!(h.store.notifications().await.is_empty());
    assert!(notifier.deliveries().is_empty());
    for alarm in h.store.alarms().await {
        assert!(alarm.last_notified_at.is_none());
    }
}

#[tokio::test]
async fn missing_rule_fails_the_pass() {
    let store = Arc::new(MemoryStore::new());
    let pass = AlarmPass::new(
        AlarmStores::from_shared(store),
        Arc::new(RecordingNotifier::default()),
    );

    let err = pass.run(t0()).await.unwrap_err();
    assert!(matches!(err, AlarmError::Rule(ref e) if e.is_not_found()));
}

#[tokio::test]
async fn drifted_rule_text_does_not_change_messages() {
    let h = Harness::new().await;
    let mut rule = data_quality_rule(10, 3);
    rule.beforehand_reminder = "Hurry up, {name}!".to_string();
    h.store.put_rule(rule).await;
    let wo = h.seed_work_order().await;
    add(&h, &wo).await;

    let notifier = Arc::new(RecordingNotifier::default());
    h.pass(notifier.clone()).run(t0() + Duration::days(8)).await.unwrap();

    assert!(notifier.deliveries()[0].message.contains("2 days remaining"));
}

#[tokio::test]
async fn batch_size_caps_each_pass() {
    let h = Harness::new().await;
    for _ in 0..3 {
        let wo = h.seed_work_order().await;
        add(&h, &wo).await;
    }

    let notifier = Arc::new(RecordingNotifier::default());
    let pass = h.pass(notifier.clone()).with_batch_size(2);
    let now = t0() + Duration::days(8);

    assert_eq!(pass.run(now).await.unwrap().created, 2);
    assert_eq!(pass.run(now).await.unwrap().created, 1);
    assert_eq!(pass.run(now).await.unwrap().due, 0);
    assert_eq!(notifier.deliveries().len(), 3);
}
