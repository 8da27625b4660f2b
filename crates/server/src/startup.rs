//! Backend selection and shutdown signalling for the binary.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use deadline_alarm::AlarmStores;
use deadline_core::config::{DeliveryConfig, PostgresConfig};
use deadline_notify::{LogNotifier, Notifier, WebhookNotifier};
use deadline_store::{MemoryStore, PgStore};

/// Connect to PostgreSQL, or fall back to the in-memory store when no
/// credentials are configured.
pub async fn open_stores(config: &PostgresConfig) -> anyhow::Result<(AlarmStores, &'static str)> {
    if !config.is_configured() {
        warn!("PG_USERNAME not set, using in-memory store; alarms and notifications are lost on restart");
        return Ok((AlarmStores::from_shared(Arc::new(MemoryStore::new())), "memory"));
    }

    let store = PgStore::connect(config)
        .await
        .context("connecting to PostgreSQL")?;
    Ok((AlarmStores::from_shared(Arc::new(store)), "postgres"))
}

/// Webhook delivery when a callback URL is set, log-only otherwise.
pub fn build_notifier(config: &DeliveryConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match &config.callback_url {
        Some(url) => {
            let notifier = WebhookNotifier::new(url.clone(), config.callback_headers.clone())
                .context("configuring delivery callback")?;
            info!(
                url = %notifier.url(),
                headers = config.callback_headers.len(),
                "delivery callback configured"
            );
            Ok(Arc::new(notifier))
        }
        None => {
            warn!("DELIVERY_CALLBACK_URL not set, alarm messages are only logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Wait for SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = &e as &dyn std::error::Error, "failed to register SIGTERM handler, waiting for ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
