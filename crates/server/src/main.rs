//! alarm-worker: keeps work-order deadline alarms in sync and sends due
//! reminders.
//!
//! Runs the reconcile loop in the background and serves:
//! - `POST /work-orders/events` for lifecycle events
//! - `POST /alarms/reconcile` for a pass on demand
//! - the recipient notification inbox under `/notifications`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use deadline_alarm::{Clock, SystemClock};
use deadline_core::Config;
use deadline_server::{build_router, startup, AppState};

/// Work-order deadline alarm worker.
#[derive(Parser, Debug)]
#[command(name = "alarm-worker", version, about)]
struct Cli {
    /// Config profile; `{PROFILE}_{KEY}` variables override `{KEY}`.
    #[arg(long, env = "DEADLINE_PROFILE", default_value = "")]
    profile: String,

    /// Seconds between reconcile passes.
    #[arg(long)]
    tick_secs: Option<u64>,

    /// Seconds an in-flight pass may take to finish on shutdown.
    #[arg(long)]
    shutdown_secs: Option<u64>,

    /// HTTP listen port.
    #[arg(long)]
    port: Option<u16>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(tick) = self.tick_secs {
            config.alarm.tick_secs = tick;
        }
        if let Some(secs) = self.shutdown_secs {
            config.alarm.shutdown_secs = secs;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    deadline_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::for_profile(&cli.profile);
    cli.apply(&mut config);
    config.log_summary();

    let (stores, backend) = startup::open_stores(&config.postgres).await?;
    let notifier = startup::build_notifier(&config.delivery)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AppState::new(stores, notifier, clock, &config.alarm, backend));

    state.controller.start()?;

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("alarm-worker listening on http://{}", addr);

    let grace = Duration::from_secs(config.alarm.shutdown_secs);
    let controller = state.controller.clone();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            startup::shutdown_signal().await;
            info!("shutdown signal received, stopping alarm controller");
            if let Err(e) = controller.stop(grace).await {
                warn!(error = &e as &dyn std::error::Error, "alarm controller did not stop cleanly");
            }
        })
        .await?;

    info!("alarm-worker exited cleanly");
    Ok(())
}
