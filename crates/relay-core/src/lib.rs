//! Relay Core - the polling and notification engine.
//!
//! The engine walks the remote hierarchy (projects → to-do lists → to-dos →
//! comments), works out what is new since the last poll, maps new items to
//! people through the recipient directory and emits one notification per
//! new item:
//!
//! - **client**: `TaskSource` trait and the reqwest-backed `BasecampClient`
//! - **directory**: mention → display-name variants, mutable at runtime
//! - **dedup**: seen task/comment sets, the only state kept between polls
//! - **engine**: `RelayContext` and `NotificationEngine` (poll cycle, daily report)
//! - **notifier**: the outbound sink trait and message formatting
//! - **config**: environment-driven configuration and state paths
//! - **clock**: local wall-clock abstraction so time gates are testable

pub mod client;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod directory;
pub mod engine;
pub mod error;
pub mod notifier;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{BasecampClient, Endpoints, TaskSource};
pub use clock::{Clock, SystemClock};
pub use config::{BasecampConfig, RelayConfig, ScheduleConfig};
pub use dedup::{DedupStore, ItemKey};
pub use directory::{AddOutcome, RecipientDirectory};
pub use engine::{CycleReport, DailyReport, NotificationEngine, RelayContext, ReportRow, ReportTrigger, SkipReason};
pub use error::{RelayError, Result};
pub use notifier::{Notification, NotificationKind, Notifier};
