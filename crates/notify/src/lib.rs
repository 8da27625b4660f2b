//! Message rendering and outbound delivery for work-order alarms.
//!
//! This crate provides:
//! - `Notifier` trait for the external delivery callback
//! - Webhook notifier posting `{PhoneNumber, Message}` JSON
//! - Log-only notifier used when no callback is configured
//! - Minijinja rendering of the fixed alarm message templates

pub mod log;
pub mod templating;
pub mod traits;
pub mod webhook;

pub use log::LogNotifier;
pub use templating::{strip_labels, MessageKind, MessageRenderer, RenderContext};
pub use traits::{Delivery, Notifier, NotifyError};
pub use webhook::WebhookNotifier;
