//! Daily report loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime};
use relay_core::{NotificationEngine, ReportTrigger};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::guarded;

/// Next time `at` occurs strictly after `now`: today if still ahead, otherwise tomorrow.
pub fn next_occurrence(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Sends the daily report at the configured wall-clock time until shutdown.
pub struct ReportLoop {
    engine: Arc<NotificationEngine>,
    shutdown: watch::Receiver<bool>,
}

impl ReportLoop {
    pub fn new(engine: Arc<NotificationEngine>, shutdown: watch::Receiver<bool>) -> Self {
        Self { engine, shutdown }
    }

    /// Run the loop until the shutdown signal.
    pub async fn run(&mut self) {
        let at = self.engine.schedule().report_time;
        // Next target is computed from the later of now and the last firing,
        // so an early timer wake-up cannot fire the same day twice.
        let mut last_fired: Option<NaiveDateTime> = None;

        debug!(report_time = %at, "starting report loop");

        loop {
            let now = self.engine.clock().now();
            let base = last_fired.map_or(now, |fired| fired.max(now));
            let target = next_occurrence(base, at);
            let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
            info!(next = %target, wait_secs = wait.as_secs(), "Daily report scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        debug!("report loop received shutdown signal");
                        break;
                    }
                    continue;
                }
            }

            last_fired = Some(target);
            match guarded(
                "daily report",
                self.engine.run_daily_report(ReportTrigger::Scheduled),
            )
            .await
            {
                Some(Ok(Some(_))) | Some(Ok(None)) | None => {}
                Some(Err(e)) => error!(error = %e, "Daily report failed"),
            }
        }

        debug!("report loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn eleven() -> NaiveTime {
        NaiveTime::from_hms_opt(11, 0, 0).unwrap()
    }

    #[test]
    fn test_next_occurrence_later_today() {
        assert_eq!(next_occurrence(at(19, 8, 30, 0), eleven()), at(19, 11, 0, 0));
    }

    #[test]
    fn test_next_occurrence_already_passed() {
        assert_eq!(next_occurrence(at(19, 11, 0, 1), eleven()), at(20, 11, 0, 0));
        assert_eq!(next_occurrence(at(19, 23, 59, 59), eleven()), at(20, 11, 0, 0));
    }

    #[test]
    fn test_next_occurrence_is_strictly_future() {
        assert_eq!(next_occurrence(at(19, 11, 0, 0), eleven()), at(20, 11, 0, 0));
    }

    #[test]
    fn test_next_occurrence_month_rollover() {
        assert_eq!(
            next_occurrence(at(31, 12, 0, 0), eleven()),
            NaiveDate::from_ymd_opt(2026, 11, 1)
                .unwrap()
                .and_hms_opt(11, 0, 0)
                .unwrap()
        );
    }
}
