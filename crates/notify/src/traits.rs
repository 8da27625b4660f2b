//! Notifier trait definition and shared error types.

use serde::Serialize;

/// Errors that can occur during rendering or delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("Callback rejected delivery with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Payload handed to the external delivery service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Delivery {
    /// Empty when the recipient has no phone number on record.
    pub phone_number: String,
    /// Plain text, label markup already stripped.
    pub message: String,
}

/// The external delivery callback.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Hand one message to the delivery service.
    async fn send(&self, delivery: &Delivery) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "webhook", "log").
    fn channel_name(&self) -> &str;
}
