//! Notification engine.
//!
//! A poll cycle walks projects → to-do lists → to-dos → comments, decides
//! what is new against the [`DedupStore`], resolves recipients through the
//! [`RecipientDirectory`] and hands messages to the [`Notifier`].
//!
//! Ordering per item is check → send → mark. An item is marked seen only
//! after every recipient it resolved to was notified successfully, so a
//! failed send leaves it eligible for the next cycle, and recipients that
//! were already reached are remembered and skipped on the retry. An item
//! that resolves to nobody is marked seen straight away.
//!
//! Cycles are serialised by a lock, which makes check-send-mark a critical
//! section on a multi-threaded runtime.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use relay_models::{Comment, Mention, Task, TaskKey};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::client::TaskSource;
use crate::clock::{Clock, SystemClock};
use crate::config::ScheduleConfig;
use crate::dedup::{DedupStore, ItemKey};
use crate::directory::RecipientDirectory;
use crate::error::Result;
use crate::notifier::{Notification, NotificationKind, Notifier};

/// Process-wide mutable state shared by the engine and the command surface.
#[derive(Debug)]
pub struct RelayContext {
    monitoring: AtomicBool,
    directory: RwLock<RecipientDirectory>,
    dedup: DedupStore,
}

impl RelayContext {
    /// Fresh state with monitoring enabled.
    pub fn new(directory: RecipientDirectory) -> Self {
        Self {
            monitoring: AtomicBool::new(true),
            directory: RwLock::new(directory),
            dedup: DedupStore::new(),
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    /// Sets the monitoring flag, returning the previous value.
    pub fn set_monitoring(&self, enabled: bool) -> bool {
        self.monitoring.swap(enabled, Ordering::SeqCst)
    }

    pub fn directory(&self) -> &RwLock<RecipientDirectory> {
        &self.directory
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }
}

/// Why a poll cycle did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MonitoringDisabled,
    OutsideActiveWindow,
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub skipped: Option<SkipReason>,
    pub tasks_scanned: usize,
    pub comments_scanned: usize,
    pub notifications_sent: usize,
    pub send_failures: usize,
}

impl CycleReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

/// Who started a daily report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTrigger {
    /// The daily timer; honours `report_respects_monitoring`.
    Scheduled,
    /// An explicit request; always runs.
    Manual,
}

/// Task counts for one mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub mention: Mention,
    pub total: usize,
    pub due_today: usize,
}

/// Per-mention task counts for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub rows: Vec<ReportRow>,
}

impl DailyReport {
    /// Sum of per-mention counts.
    pub fn total_tasks(&self) -> usize {
        self.rows.iter().map(|r| r.total).sum()
    }

    pub fn render(&self) -> String {
        let mut text = String::from("🕚 Ежедневный отчёт\n\n");
        if self.rows.is_empty() {
            text.push_str("В команде пока никого нет.\n");
        }
        for row in &self.rows {
            text.push_str(&format!("{} — {} задач(и) сегодня", row.mention, row.total));
            if row.due_today > 0 {
                text.push_str(&format!(" (с дедлайном сегодня: {})", row.due_today));
            }
            text.push('\n');
        }
        text
    }
}

/// Distinct mentions for a task's assignees, in assignee order.
fn resolve_assignees(directory: &RecipientDirectory, task: &Task) -> Vec<Mention> {
    let mut mentions: Vec<Mention> = Vec::new();
    for name in task.assignee_names() {
        if let Some(mention) = directory.resolve(name) {
            if !mentions.contains(mention) {
                mentions.push(mention.clone());
            }
        }
    }
    mentions
}

/// Drives poll cycles and daily reports.
pub struct NotificationEngine {
    context: Arc<RelayContext>,
    source: Arc<dyn TaskSource>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    schedule: ScheduleConfig,
    cycle_lock: Mutex<()>,
}

impl NotificationEngine {
    /// Creates an engine on the system clock.
    pub fn new(
        context: Arc<RelayContext>,
        source: Arc<dyn TaskSource>,
        notifier: Arc<dyn Notifier>,
        schedule: ScheduleConfig,
    ) -> Self {
        Self {
            context,
            source,
            notifier,
            clock: Arc::new(SystemClock),
            schedule,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn context(&self) -> &Arc<RelayContext> {
        &self.context
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Runs one poll cycle.
    ///
    /// No-op while monitoring is off or outside the active window.
    pub async fn run_poll_cycle(&self) -> CycleReport {
        let _cycle = self.cycle_lock.lock().await;

        if !self.context.is_monitoring() {
            debug!("Monitoring disabled, skipping poll cycle");
            return CycleReport::skipped(SkipReason::MonitoringDisabled);
        }
        let now = self.clock.now();
        if !self.schedule.in_active_window(now.time()) {
            debug!(time = %now.time(), "Outside active window, skipping poll cycle");
            return CycleReport::skipped(SkipReason::OutsideActiveWindow);
        }

        // Roster edits made during the walk apply from the next cycle.
        let directory = self.context.directory.read().await.clone();
        let mut report = CycleReport::default();

        for project in self.source.list_projects().await {
            for list in self.source.list_task_lists(project.id).await {
                for task in self.source.list_tasks(project.id, list.id).await {
                    report.tasks_scanned += 1;
                    self.process_task(&directory, project.id, &task, &mut report)
                        .await;

                    for comment in self.source.list_comments(project.id, task.id).await {
                        report.comments_scanned += 1;
                        self.process_comment(&directory, &task, &comment, &mut report)
                            .await;
                    }
                }
            }
        }

        info!(
            tasks = report.tasks_scanned,
            comments = report.comments_scanned,
            sent = report.notifications_sent,
            failed = report.send_failures,
            "Poll cycle complete"
        );
        report
    }

    async fn process_task(
        &self,
        directory: &RecipientDirectory,
        project_id: u64,
        task: &Task,
        report: &mut CycleReport,
    ) {
        let key = TaskKey::new(project_id, task.id);
        if self.context.dedup.has_seen_task(&key) {
            return;
        }

        let recipients = resolve_assignees(directory, task);
        let delivered = self
            .deliver(ItemKey::Task(key), &recipients, report, |m| {
                Notification::new_task(m, task)
            })
            .await;

        if delivered {
            debug!(task = %key, recipients = recipients.len(), "Task marked seen");
            self.context.dedup.mark_task_seen(key);
        }
    }

    async fn process_comment(
        &self,
        directory: &RecipientDirectory,
        task: &Task,
        comment: &Comment,
        report: &mut CycleReport,
    ) {
        if self.context.dedup.has_seen_comment(comment.id) {
            return;
        }

        let recipients = directory.mentions_in(&comment.content);
        let delivered = self
            .deliver(ItemKey::Comment(comment.id), &recipients, report, |m| {
                Notification::task_update(m, task)
            })
            .await;

        if delivered {
            debug!(comment = comment.id, recipients = recipients.len(), "Comment marked seen");
            self.context.dedup.mark_comment_seen(comment.id);
        }
    }

    /// Sends one message per recipient not yet reached for `item`.
    ///
    /// Returns true when every recipient has now been notified.
    async fn deliver<F>(
        &self,
        item: ItemKey,
        recipients: &[Mention],
        report: &mut CycleReport,
        build: F,
    ) -> bool
    where
        F: Fn(&Mention) -> Notification,
    {
        let already = self.context.dedup.delivered_to(&item);
        let mut complete = true;

        for mention in recipients {
            if already.contains(mention) {
                continue;
            }
            let notification = build(mention);
            match self.notifier.send(&notification).await {
                Ok(()) => {
                    report.notifications_sent += 1;
                    self.context.dedup.record_delivery(item, mention.clone());
                    info!(item = ?item, mention = %mention, kind = ?notification.kind, "Notification sent");
                }
                Err(e) => {
                    report.send_failures += 1;
                    complete = false;
                    warn!(item = ?item, mention = %mention, error = %e, "Notification failed, will retry next cycle");
                }
            }
        }

        complete
    }

    /// Tallies open tasks per mention and sends one consolidated message.
    ///
    /// Ignores the active window. A scheduled run is skipped while
    /// monitoring is off only if `report_respects_monitoring` is set;
    /// returns `Ok(None)` in that case.
    pub async fn run_daily_report(&self, trigger: ReportTrigger) -> Result<Option<DailyReport>> {
        if trigger == ReportTrigger::Scheduled
            && self.schedule.report_respects_monitoring
            && !self.context.is_monitoring()
        {
            info!("Monitoring disabled, skipping daily report");
            return Ok(None);
        }

        let today = self.clock.now().date();
        let today_str = today.format("%Y-%m-%d").to_string();
        let directory = self.context.directory.read().await.clone();

        let mut counts: BTreeMap<Mention, (usize, usize)> = directory
            .mentions()
            .map(|m| (m.clone(), (0, 0)))
            .collect();

        for project in self.source.list_projects().await {
            for list in self.source.list_task_lists(project.id).await {
                for task in self.source.list_tasks(project.id, list.id).await {
                    let due_today = task.is_due_on(&today_str);
                    for mention in resolve_assignees(&directory, &task) {
                        let entry = counts.entry(mention).or_default();
                        entry.0 += 1;
                        if due_today {
                            entry.1 += 1;
                        }
                    }
                }
            }
        }

        let report = DailyReport {
            date: today,
            rows: counts
                .into_iter()
                .map(|(mention, (total, due_today))| ReportRow {
                    mention,
                    total,
                    due_today,
                })
                .collect(),
        };

        self.notifier
            .send(&Notification::broadcast(
                NotificationKind::DailyReport,
                report.render(),
            ))
            .await?;

        info!(
            date = %report.date,
            mentions = report.rows.len(),
            tasks = report.total_tasks(),
            trigger = ?trigger,
            "Daily report sent"
        );
        Ok(Some(report))
    }
}
