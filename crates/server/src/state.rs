use std::sync::Arc;
use std::time::Duration;

use deadline_alarm::{AlarmPass, AlarmStores, Clock, WorkOrderAlarmController, WorkOrderReconciler};
use deadline_core::config::AlarmConfig;
use deadline_notify::Notifier;

/// Shared state behind every handler.
pub struct AppState {
    pub stores: AlarmStores,
    pub reconciler: WorkOrderReconciler,
    pub controller: Arc<WorkOrderAlarmController>,
    pub clock: Arc<dyn Clock>,
    /// "postgres" or "memory".
    pub store_backend: &'static str,
    pub delivery_channel: String,
}

impl AppState {
    pub fn new(
        stores: AlarmStores,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        alarm: &AlarmConfig,
        store_backend: &'static str,
    ) -> Self {
        let delivery_channel = notifier.channel_name().to_string();
        let pass = AlarmPass::new(stores.clone(), notifier).with_batch_size(alarm.batch_size);
        let controller = WorkOrderAlarmController::new(
            pass,
            clock.clone(),
            Duration::from_secs(alarm.tick_secs.max(1)),
        );
        Self {
            reconciler: WorkOrderReconciler::new(&stores, clock.clone()),
            stores,
            controller: Arc::new(controller),
            clock,
            store_backend,
            delivery_channel,
        }
    }
}
