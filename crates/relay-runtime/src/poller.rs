//! Poll loop.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{NotificationEngine, SkipReason};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::guarded;

/// Runs a poll cycle every `poll_interval` until shutdown.
pub struct PollLoop {
    engine: Arc<NotificationEngine>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl PollLoop {
    /// Creates a poll loop using the engine's configured interval.
    pub fn new(engine: Arc<NotificationEngine>, shutdown: watch::Receiver<bool>) -> Self {
        let interval = engine.schedule().poll_interval;
        Self {
            engine,
            interval,
            shutdown,
        }
    }

    /// Run the loop until the shutdown signal.
    pub async fn run(&mut self) {
        debug!(interval_secs = self.interval.as_secs(), "starting poll loop");

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            if let Some(report) = guarded("poll cycle", self.engine.run_poll_cycle()).await {
                match report.skipped {
                    Some(SkipReason::MonitoringDisabled) => trace!("cycle skipped: monitoring off"),
                    Some(SkipReason::OutsideActiveWindow) => trace!("cycle skipped: outside window"),
                    None => {}
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        debug!("poll loop received shutdown signal");
                        break;
                    }
                }
            }
        }

        debug!("poll loop stopped");
    }
}
