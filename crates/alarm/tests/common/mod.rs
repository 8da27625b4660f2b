#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use deadline_alarm::{AlarmPass, AlarmStores, ManualClock, WorkOrderReconciler};
use deadline_core::{
    AlarmRule, WorkOrder, WorkOrderStatus, WorkOrderType, CANONICAL_BEFOREHAND_REMINDER,
    CANONICAL_DEADLINE_REMINDER,
};
use deadline_notify::{Delivery, Notifier, NotifyError};
use deadline_store::MemoryStore;

pub const PHONE: &str = "+49 30 1234567";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

pub fn data_quality_rule(deadline_time: i32, beforehand_time: i32) -> AlarmRule {
    AlarmRule {
        work_order_type: WorkOrderType::DataQuality,
        deadline_time,
        beforehand_time,
        deadline_reminder: CANONICAL_DEADLINE_REMINDER.to_string(),
        beforehand_reminder: CANONICAL_BEFOREHAND_REMINDER.to_string(),
    }
}

pub fn work_order(created_at: DateTime<Utc>, responsible_uid: Uuid) -> WorkOrder {
    WorkOrder {
        id: Uuid::new_v4(),
        work_order_type: WorkOrderType::DataQuality,
        status: WorkOrderStatus::Pending,
        created_at,
        finished_at: None,
        responsible_uid,
        name: "Orders table null check".to_string(),
        code: "WO-0042".to_string(),
    }
}

/// Records every delivery it is handed.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingNotifier {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, delivery: &Delivery) -> Result<(), NotifyError> {
        self.deliveries.lock().unwrap().push(delivery.clone());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

/// Rejects every delivery.
#[derive(Debug, Default)]
pub struct FailingNotifier {
    pub attempts: AtomicUsize,
}

#[async_trait::async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _delivery: &Delivery) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Rejected {
            status: 503,
            body: "unavailable".to_string(),
        })
    }

    fn channel_name(&self) -> &str {
        "failing"
    }
}

/// A memory store seeded with the 10/3 data-quality rule, plus the engine
/// pieces wired against it.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub stores: AlarmStores,
    pub reconciler: WorkOrderReconciler,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        store.put_rule(data_quality_rule(10, 3)).await;
        let clock = Arc::new(ManualClock::new(t0()));
        let stores = AlarmStores::from_shared(store.clone());
        let reconciler = WorkOrderReconciler::new(&stores, clock.clone());
        Self {
            store,
            clock,
            stores,
            reconciler,
        }
    }

    pub fn pass(&self, notifier: Arc<dyn Notifier>) -> AlarmPass {
        AlarmPass::new(self.stores.clone(), notifier)
    }

    /// Store a pending work order created at T0 whose owner has [`PHONE`].
    pub async fn seed_work_order(&self) -> WorkOrder {
        let owner = Uuid::new_v4();
        self.store.put_user(owner, Some(PHONE.to_string())).await;
        let wo = work_order(t0(), owner);
        self.store.put_work_order(wo.clone()).await;
        wo
    }
}
