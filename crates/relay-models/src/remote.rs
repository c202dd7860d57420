//! Records fetched from the project-management API.
//!
//! Only the fields the relay reads are modelled; everything else in the
//! Basecamp payload is ignored. Optional fields default instead of failing
//! the whole list.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rendered in place of a missing due date.
pub const UNSPECIFIED_DUE: &str = "Не указан";

/// A person reference (assignee or comment creator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub name: String,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A project (Basecamp "bucket"). Only the id is used to scope queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// A to-do list inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: u64,
    #[serde(default)]
    pub title: String,
}

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub due_on: Option<String>,
    #[serde(default)]
    pub app_url: String,
    #[serde(default)]
    pub assignees: Vec<Person>,
}

impl Task {
    /// Due date as shown to people.
    pub fn due_label(&self) -> &str {
        match self.due_on.as_deref() {
            Some(due) if !due.trim().is_empty() => due,
            _ => UNSPECIFIED_DUE,
        }
    }

    /// Whether the task is due on `date` (formatted `YYYY-MM-DD`).
    pub fn is_due_on(&self, date: &str) -> bool {
        self.due_on.as_deref() == Some(date)
    }

    /// Assignee display names in payload order.
    pub fn assignee_names(&self) -> impl Iterator<Item = &str> {
        self.assignees.iter().map(|p| p.name.as_str())
    }
}

/// A comment on a to-do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub creator: Person,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Dedup identity of a task.
///
/// Task ids are only unique within a project in some deployments, so the
/// project id is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey {
    pub project_id: u64,
    pub task_id: u64,
}

impl TaskKey {
    pub fn new(project_id: u64, task_id: u64) -> Self {
        Self {
            project_id,
            task_id,
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.project_id, self.task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_from_basecamp_payload() {
        let payload = json!({
            "id": 42,
            "title": "Подготовить отчёт",
            "due_on": "2026-10-20",
            "app_url": "https://3.basecamp.com/1/buckets/7/todos/42",
            "assignees": [{"id": 5, "name": "Алиса Федяшова", "email_address": "a@example.com"}],
            "status": "active"
        });

        let task: Task = serde_json::from_value(payload).unwrap();
        assert_eq!(task.id, 42);
        assert_eq!(task.due_label(), "2026-10-20");
        assert!(task.is_due_on("2026-10-20"));
        assert_eq!(task.assignee_names().collect::<Vec<_>>(), vec!["Алиса Федяшова"]);
    }

    #[test]
    fn test_task_missing_optional_fields() {
        let task: Task = serde_json::from_value(json!({"id": 1, "due_on": null})).unwrap();
        assert_eq!(task.due_label(), UNSPECIFIED_DUE);
        assert!(task.assignees.is_empty());
        assert!(task.title.is_empty());
    }

    #[test]
    fn test_comment_without_creator() {
        let comment: Comment =
            serde_json::from_value(json!({"id": 9, "content": "<div>ok</div>"})).unwrap();
        assert_eq!(comment.creator.name, "");
        assert_eq!(comment.content, "<div>ok</div>");
    }

    #[test]
    fn test_task_key_is_scoped_by_project() {
        let a = TaskKey::new(1, 42);
        let b = TaskKey::new(2, 42);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "1-42");
    }
}
