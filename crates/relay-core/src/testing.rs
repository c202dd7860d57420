//! In-memory fakes for tests.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for dependants' dev builds.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use relay_models::{Comment, Mention, Person, Project, Task, TaskList};

use crate::clock::Clock;
use crate::error::{RelayError, Result};
use crate::notifier::{Notification, Notifier};

/// Builds a task with one or more assignees.
pub fn task(id: u64, title: &str, assignees: &[&str]) -> Task {
    Task {
        id,
        title: title.to_string(),
        due_on: None,
        app_url: format!("https://3.basecamp.com/1/todos/{}", id),
        assignees: assignees.iter().map(|n| Person::new(*n)).collect(),
    }
}

/// Builds a comment.
pub fn comment(id: u64, content: &str) -> Comment {
    Comment {
        id,
        content: content.to_string(),
        creator: Person::new("Someone"),
        created_at: None,
    }
}

#[derive(Debug, Default)]
struct Tree {
    projects: Vec<Project>,
    lists: HashMap<u64, Vec<TaskList>>,
    tasks: HashMap<(u64, u64), Vec<Task>>,
    comments: HashMap<(u64, u64), Vec<Comment>>,
}

/// A fixed project tree served from memory.
#[derive(Debug, Default)]
pub struct FakeSource {
    tree: Mutex<Tree>,
    project_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> std::sync::MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds `task` under project/list, creating both on first use.
    pub fn add_task(&self, project_id: u64, list_id: u64, task: Task) {
        let mut tree = self.tree();
        if !tree.projects.iter().any(|p| p.id == project_id) {
            tree.projects.push(Project {
                id: project_id,
                name: format!("project {}", project_id),
            });
        }
        let lists = tree.lists.entry(project_id).or_default();
        if !lists.iter().any(|l| l.id == list_id) {
            lists.push(TaskList {
                id: list_id,
                title: format!("list {}", list_id),
            });
        }
        tree.tasks.entry((project_id, list_id)).or_default().push(task);
    }

    pub fn add_comment(&self, project_id: u64, task_id: u64, comment: Comment) {
        self.tree()
            .comments
            .entry((project_id, task_id))
            .or_default()
            .push(comment);
    }

    /// How many times `list_projects` ran, i.e. how many walks started.
    pub fn project_calls(&self) -> usize {
        self.project_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl crate::client::TaskSource for FakeSource {
    async fn list_projects(&self) -> Vec<Project> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        self.tree().projects.clone()
    }

    async fn list_task_lists(&self, project_id: u64) -> Vec<TaskList> {
        self.tree().lists.get(&project_id).cloned().unwrap_or_default()
    }

    async fn list_tasks(&self, project_id: u64, task_list_id: u64) -> Vec<Task> {
        self.tree()
            .tasks
            .get(&(project_id, task_list_id))
            .cloned()
            .unwrap_or_default()
    }

    async fn list_comments(&self, project_id: u64, task_id: u64) -> Vec<Comment> {
        self.tree()
            .comments
            .get(&(project_id, task_id))
            .cloned()
            .unwrap_or_default()
    }
}

/// Records every notification; can be told to fail for chosen recipients.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: Mutex<HashSet<Option<Mention>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends addressed to `recipient` (`None` = broadcasts) fail until cleared.
    pub fn fail_for(&self, recipient: Option<Mention>) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(recipient);
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let fails = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&notification.recipient);
        if fails {
            return Err(RelayError::Notify("transport unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(())
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock set to `hour:minute` on 2026-10-19.
    pub fn at(hour: u32, minute: u32) -> Self {
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid test time");
        Self::new(now)
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
