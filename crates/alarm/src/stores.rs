use std::sync::Arc;

use deadline_store::{
    AlarmRuleStore, NotificationStore, UserStore, WorkOrderAlarmStore, WorkOrderStore,
};

/// The store handles the alarm engine depends on.
#[derive(Clone)]
pub struct AlarmStores {
    pub rules: Arc<dyn AlarmRuleStore>,
    pub work_orders: Arc<dyn WorkOrderStore>,
    pub users: Arc<dyn UserStore>,
    pub alarms: Arc<dyn WorkOrderAlarmStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl AlarmStores {
    /// Use one backend for every store.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: AlarmRuleStore
            + WorkOrderStore
            + UserStore
            + WorkOrderAlarmStore
            + NotificationStore
            + 'static,
    {
        Self {
            rules: store.clone(),
            work_orders: store.clone(),
            users: store.clone(),
            alarms: store.clone(),
            notifications: store,
        }
    }
}
