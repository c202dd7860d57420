//! Scheduler for the Basecamp relay.
//!
//! Two independent loops share one `NotificationEngine`:
//! - `PollLoop` runs a poll cycle, then waits the configured interval,
//!   forever. The wait is unconditional; the engine's own gates decide
//!   whether a cycle does anything.
//! - `ReportLoop` sleeps until the next occurrence of the report time,
//!   sends the daily report, and repeats.
//!
//! `Scheduler` spawns both and stops them through a `watch` channel. A
//! panicking cycle is logged and the loop carries on.
//!
//! # Example
//!
//! ```ignore
//! let mut scheduler = Scheduler::new(Arc::clone(&engine));
//! scheduler.start()?;
//! tokio::signal::ctrl_c().await?;
//! scheduler.shutdown().await?;
//! ```

pub mod error;
pub mod poller;
pub mod report;
pub mod scheduler;

pub use error::{Result, SchedulerError};
pub use poller::PollLoop;
pub use report::{next_occurrence, ReportLoop};
pub use scheduler::Scheduler;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

/// Awaits `fut`, converting a panic into a logged `None`.
pub(crate) async fn guarded<F: Future>(job: &'static str, fut: F) -> Option<F::Output> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(output) => Some(output),
        Err(payload) => {
            error!(job, panic = %panic_message(&*payload), "Job panicked, loop continues");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
