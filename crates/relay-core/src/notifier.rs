//! Outbound notifications.
//!
//! The engine never talks to a chat transport directly: it builds a
//! [`Notification`] and hands it to a [`Notifier`]. The text already carries
//! the addressee's mention, so a transport that posts everything to one
//! group chat needs nothing else.

use async_trait::async_trait;
use relay_models::{Mention, Task};

use crate::error::Result;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A task assigned to the recipient appeared.
    NewTask,
    /// A comment naming the recipient appeared.
    TaskUpdate,
    /// Consolidated per-person task counts.
    DailyReport,
}

/// A ready-to-send message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Addressee; `None` for broadcast messages such as the daily report.
    pub recipient: Option<Mention>,
    pub text: String,
}

impl Notification {
    /// "New task" message for an assignee.
    pub fn new_task(mention: &Mention, task: &Task) -> Self {
        Self {
            kind: NotificationKind::NewTask,
            recipient: Some(mention.clone()),
            text: format!(
                "{}, обрати внимание: новая задача «{}» (дедлайн: {})\n{}",
                mention,
                task.title,
                task.due_label(),
                task.app_url
            ),
        }
    }

    /// "Update" message for someone named in a comment.
    pub fn task_update(mention: &Mention, task: &Task) -> Self {
        Self {
            kind: NotificationKind::TaskUpdate,
            recipient: Some(mention.clone()),
            text: format!("{}, апдейт в задаче «{}»\n{}", mention, task.title, task.app_url),
        }
    }

    /// Broadcast message without a single addressee.
    pub fn broadcast(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            recipient: None,
            text: text.into(),
        }
    }
}

/// Sink for outbound notifications.
///
/// An `Err` means the message was not delivered; the engine then leaves the
/// item unseen so the next cycle retries it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}
