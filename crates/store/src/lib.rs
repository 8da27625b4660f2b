//! Persistence contracts for the alarm engine.
//!
//! This crate provides:
//! - Store traits for rules, work orders, users, alarms and notifications
//! - [`DueAlarmQuery`], the single definition of "which alarms fire now"
//! - [`MemoryStore`], an in-process implementation of every trait
//! - [`PgStore`], the PostgreSQL implementation backed by `sqlx`

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use query::{DueAlarmQuery, DEFAULT_BATCH_SIZE};
pub use traits::{
    AlarmRuleStore, InsertOutcome, NotificationStore, UserStore, WorkOrderAlarmStore,
    WorkOrderStore,
};
