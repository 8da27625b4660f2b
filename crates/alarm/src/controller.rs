//! Periodic driver for [`AlarmPass`].
//!
//! The loop waits one full interval before the first pass, then runs one pass
//! per tick. Shutdown is only observed between passes, so a pass that has
//! started always runs to completion.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{AlarmError, ControllerError};
use crate::pass::{AlarmPass, PassReport};

/// Default interval between passes.
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

struct Core {
    pass: AlarmPass,
    clock: Arc<dyn Clock>,
    tick: Duration,
    /// Held for the duration of a pass; scheduled and manual passes share it.
    pass_lock: tokio::sync::Mutex<()>,
}

impl Core {
    async fn reconcile(&self) -> Result<PassReport, AlarmError> {
        let _guard = self.pass_lock.lock().await;
        self.pass.run(self.clock.now()).await
    }

    async fn run_loop(&self, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(tick_secs = self.tick.as_secs(), "alarm controller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            match self.reconcile().await {
                Ok(report) if report.due > 0 => info!(
                    due = report.due,
                    created = report.created,
                    already_present = report.already_present,
                    delivered = report.delivered,
                    delivery_failures = report.delivery_failures,
                    "alarm pass finished"
                ),
                Ok(_) => debug!("alarm pass found nothing due"),
                Err(e) => warn!(
                    error = &e as &dyn std::error::Error,
                    "alarm pass failed, retrying next tick"
                ),
            }
        }

        info!("alarm controller stopped");
    }
}

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Runs reconcile passes on a fixed interval.
pub struct WorkOrderAlarmController {
    core: Arc<Core>,
    running: Mutex<Option<Running>>,
}

impl WorkOrderAlarmController {
    pub fn new(pass: AlarmPass, clock: Arc<dyn Clock>, tick: Duration) -> Self {
        Self {
            core: Arc::new(Core {
                pass,
                clock,
                tick,
                pass_lock: tokio::sync::Mutex::new(()),
            }),
            running: Mutex::new(None),
        }
    }

    /// Run one pass now. Waits for a scheduled pass in progress to finish.
    pub async fn reconcile(&self) -> Result<PassReport, AlarmError> {
        self.core.reconcile().await
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Spawn the loop on the current runtime.
    pub fn start(&self) -> Result<(), ControllerError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return Err(ControllerError::AlreadyRunning);
        }

        let (tx, rx) = watch::channel(false);
        let core = Arc::clone(&self.core);
        let handle = tokio::spawn(async move { core.run_loop(rx).await });
        *running = Some(Running {
            shutdown: tx,
            handle,
        });
        Ok(())
    }

    /// Request shutdown and wait up to `grace` for the loop to exit.
    ///
    /// On timeout the loop keeps running until its current pass completes,
    /// then exits on its own.
    pub async fn stop(&self, grace: Duration) -> Result<(), ControllerError> {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Running { shutdown, handle }) = running else {
            return Ok(());
        };

        let _ = shutdown.send(true);
        match tokio::time::timeout(grace, handle).await {
            Ok(joined) => joined.map_err(ControllerError::from),
            Err(_) => {
                warn!(?grace, "alarm controller did not stop in time");
                Err(ControllerError::StopTimeout(grace))
            }
        }
    }

    /// Run the loop in the current task until `shutdown` turns true or its
    /// sender is dropped.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        self.core.run_loop(shutdown).await;
    }
}
