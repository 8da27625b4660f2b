//! Shared domain types and configuration for the work-order deadline alarm engine.

pub mod alarm;
pub mod config;
pub mod error;
pub mod notification;
pub mod work_order;

pub use alarm::*;
pub use config::Config;
pub use error::*;
pub use notification::*;
pub use work_order::*;
