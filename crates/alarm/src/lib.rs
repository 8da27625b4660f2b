//! Work-order deadline alarms.
//!
//! - [`WorkOrderReconciler`] keeps one alarm per active work order in sync
//!   with lifecycle events.
//! - [`AlarmPass`] is one scheduling pass: select due alarms, render,
//!   idempotently store and deliver notifications.
//! - [`WorkOrderAlarmController`] runs passes on a fixed interval until
//!   stopped.

pub mod clock;
pub mod controller;
pub mod days;
pub mod error;
pub mod pass;
pub mod reconciler;
pub mod stores;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::WorkOrderAlarmController;
pub use days::ceil_days;
pub use error::{AlarmError, ControllerError, ReconcileError, StepError};
pub use pass::{AlarmPass, PassReport};
pub use reconciler::{WorkOrderReconciler, ALERTING_WORK_ORDER_TYPE};
pub use stores::AlarmStores;
