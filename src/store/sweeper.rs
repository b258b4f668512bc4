//! Background Expiry Sweeper
//!
//! Lazy expiry only removes a key when something reads it. A key that
//! expires and is never touched again would otherwise stay resident
//! forever, so a background task periodically sweeps the whole map and
//! removes every entry past its deadline, bounding memory independent of
//! traffic.
//!
//! The sweeper runs as a tokio task with a fixed period and an explicit
//! shutdown handle; dropping the handle stops the task. Each tick is a
//! single call to [`Store::sweep`], one lock acquisition for the whole
//! pass.

use crate::store::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Time between sweep passes (default: 1 second)
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// A handle to the running sweeper task.
///
/// The task stops when [`SweeperHandle::stop`] is called or the handle is
/// dropped.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl SweeperHandle {
    /// Spawns the sweeper as a background task over the given store.
    pub fn start(store: Arc<Store>, config: SweeperConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(sweep_loop(store, config, shutdown_rx));
        info!("background expiry sweeper started");

        Self { shutdown_tx }
    }

    /// Signals the sweeper task to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweep_loop(store: Arc<Store>, config: SweeperConfig, mut shutdown_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.sweep();
                if removed > 0 {
                    debug!(removed, remaining = store.len(), "swept expired keys");
                }
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("expiry sweeper shutting down");
                    return;
                }
            }
        }
    }
}

/// Starts the sweeper with the default one-second period.
pub fn start_sweeper(store: Arc<Store>) -> SweeperHandle {
    SweeperHandle::start(store, SweeperConfig::default())
}
