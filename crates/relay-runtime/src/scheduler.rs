//! Scheduler combining the poll and report loops.

use std::sync::Arc;

use relay_core::NotificationEngine;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{Result, SchedulerError};
use crate::poller::PollLoop;
use crate::report::ReportLoop;

/// Owns the two background loops.
pub struct Scheduler {
    engine: Arc<NotificationEngine>,
    poll_handle: Option<JoinHandle<()>>,
    report_handle: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    started: bool,
}

impl Scheduler {
    pub fn new(engine: Arc<NotificationEngine>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            engine,
            poll_handle: None,
            report_handle: None,
            shutdown_tx,
            shutdown_rx,
            started: false,
        }
    }

    /// Spawn both loops. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(SchedulerError::AlreadyStarted);
        }

        let schedule = self.engine.schedule();
        info!(
            poll_interval_secs = schedule.poll_interval.as_secs(),
            active_start = %schedule.active_start,
            active_end = %schedule.active_end,
            report_time = %schedule.report_time,
            "starting scheduler"
        );

        let mut poll = PollLoop::new(Arc::clone(&self.engine), self.shutdown_rx.clone());
        self.poll_handle = Some(tokio::spawn(async move { poll.run().await }));

        let mut report = ReportLoop::new(Arc::clone(&self.engine), self.shutdown_rx.clone());
        self.report_handle = Some(tokio::spawn(async move { report.run().await }));

        self.started = true;
        Ok(())
    }

    /// Signal both loops to stop and wait for them.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.started {
            return Err(SchedulerError::NotStarted);
        }

        info!("shutting down scheduler");

        self.shutdown_tx.send(true).map_err(|e| {
            SchedulerError::Shutdown(format!("failed to send shutdown signal: {}", e))
        })?;

        for (name, handle) in [
            ("poll", self.poll_handle.take()),
            ("report", self.report_handle.take()),
        ] {
            if let Some(handle) = handle {
                debug!(job = name, "waiting for loop to stop");
                handle.await.map_err(|e| {
                    SchedulerError::Shutdown(format!("{} loop task failed: {}", name, e))
                })?;
            }
        }

        self.started = false;
        info!("scheduler stopped");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.started {
            let _ = self.shutdown_tx.send(true);
        }
    }
}
