//! Lifecycle events and the alarm table.

mod common;

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use deadline_alarm::{AlarmStores, ManualClock, ReconcileError, WorkOrderReconciler};
use deadline_core::{WorkOrderEvent, WorkOrderEventKind, WorkOrderStatus, WorkOrderType};
use deadline_store::MemoryStore;

use common::{data_quality_rule, t0, work_order, Harness};

#[tokio::test]
async fn added_creates_alarm_at_creation_plus_deadline_days() {
    let h = Harness::new().await;
    let wo = h.seed_work_order().await;

    h.reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Added, wo.clone()))
        .await
        .unwrap();

    let alarms = h.store.alarms().await;
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].work_order_id, wo.id);
    assert_eq!(alarms[0].deadline, t0() + Duration::days(10));
    assert!(alarms[0].last_notified_at.is_none());
}

#[tokio::test]
async fn repeated_added_is_reported_as_redelivery() {
    let h = Harness::new().await;
    let wo = h.seed_work_order().await;
    let event = WorkOrderEvent::new(WorkOrderEventKind::Added, wo);

    h.reconciler.reconcile(&event).await.unwrap();
    let err = h.reconciler.reconcile(&event).await.unwrap_err();

    assert!(err.is_redelivery());
    assert_eq!(h.store.alarms().await.len(), 1);
}

#[tokio::test]
async fn oversized_deadline_offset_is_rejected() {
    let h = Harness::new().await;
    h.store.put_rule(data_quality_rule(200_000_000, 3)).await;
    let wo = h.seed_work_order().await;

    let err = h
        .reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Added, wo.clone()))
        .await
        .unwrap_err();

    match &err {
        ReconcileError::InvalidRule { work_order_id, .. } => assert_eq!(*work_order_id, wo.id),
        other => panic!("expected invalid rule, got: {other:?}"),
    }
    assert!(!err.is_redelivery());
    assert!(h.store.alarms().await.is_empty());
}

#[tokio::test]
async fn added_without_rule_fails() {
    let store = Arc::new(MemoryStore::new());
    let stores = AlarmStores::from_shared(store.clone());
    let reconciler = WorkOrderReconciler::new(&stores, Arc::new(ManualClock::new(t0())));

    let err = reconciler
        .reconcile(&WorkOrderEvent::new(
            WorkOrderEventKind::Added,
            work_order(t0(), Uuid::new_v4()),
        ))
        .await
        .unwrap_err();

    assert!(!err.is_redelivery());
    assert!(store.alarms().await.is_empty());
}

#[tokio::test]
async fn other_work_order_types_are_ignored() {
    let h = Harness::new().await;
    let mut wo = h.seed_work_order().await;
    wo.work_order_type = WorkOrderType::Other;

    for kind in [
        WorkOrderEventKind::Added,
        WorkOrderEventKind::Modified,
        WorkOrderEventKind::Deleted,
    ] {
        h.reconciler
            .reconcile(&WorkOrderEvent::new(kind, wo.clone()))
            .await
            .unwrap();
    }

    assert!(h.store.alarms().await.is_empty());
}

#[tokio::test]
async fn modified_removes_alarm_only_when_finished() {
    let h = Harness::new().await;
    let mut wo = h.seed_work_order().await;
    h.reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Added, wo.clone()))
        .await
        .unwrap();

    wo.status = WorkOrderStatus::Processing;
    h.reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Modified, wo.clone()))
        .await
        .unwrap();
    assert_eq!(h.store.alarms().await.len(), 1);

    wo.status = WorkOrderStatus::Finished;
    wo.finished_at = Some(t0() + Duration::days(2));
    h.reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Modified, wo))
        .await
        .unwrap();
    assert!(h.store.alarms().await.is_empty());
}

#[tokio::test]
async fn deleted_removes_alarm_and_tolerates_absence() {
    let h = Harness::new().await;
    let wo = h.seed_work_order().await;
    h.reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Added, wo.clone()))
        .await
        .unwrap();

    let deleted = WorkOrderEvent::new(WorkOrderEventKind::Deleted, wo);
    h.reconciler.reconcile(&deleted).await.unwrap();
    assert!(h.store.alarms().await.is_empty());

    h.reconciler.reconcile(&deleted).await.unwrap();
}

#[tokio::test]
async fn unknown_event_kind_is_ignored() {
    let h = Harness::new().await;
    let wo = h.seed_work_order().await;

    h.reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Unknown, wo))
        .await
        .unwrap();

    assert!(h.store.alarms().await.is_empty());
}

#[tokio::test]
async fn work_order_added_already_finished_gets_no_alarm() {
    let h = Harness::new().await;
    let mut wo = h.seed_work_order().await;
    wo.status = WorkOrderStatus::Finished;

    h.reconciler
        .reconcile(&WorkOrderEvent::new(WorkOrderEventKind::Added, wo))
        .await
        .unwrap();

    assert!(h.store.alarms().await.is_empty());
}
