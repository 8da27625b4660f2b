//! Notifier that only records deliveries in the log.

use crate::traits::{Delivery, Notifier, NotifyError};

/// Used when no delivery callback is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, delivery: &Delivery) -> Result<(), NotifyError> {
        tracing::info!(
            phone_number = %delivery.phone_number,
            message = %delivery.message,
            "delivery callback not configured, message logged only"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
