//! Task data structure and related functionality.
//!
//! A `Task` is a snapshot of a stored work item as handed over by the storage
//! collaborator. Dates and timestamps are kept exactly as received; the views
//! parse them lazily and treat anything malformed as absent.

use serde::{Deserialize, Serialize};

use crate::dates::parse_millis;
use crate::fields::{Status, Visibility};

/// A user profile assigned to a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignee {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A work item belonging to exactly one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw workflow status. Values outside the known set are kept so they can
    /// be dropped from the board instead of failing deserialization.
    pub status: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
}

impl Task {
    /// Known workflow status, or `None` for unrecognized values.
    pub fn workflow_status(&self) -> Option<Status> {
        Status::parse(&self.status)
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status.as_str().to_string();
    }

    pub fn is_published(&self) -> bool {
        self.visibility == Visibility::Published
    }

    /// Due date in epoch milliseconds, if present and parseable.
    pub fn due_millis(&self) -> Option<i64> {
        self.due_date.as_deref().and_then(parse_millis)
    }

    /// Creation timestamp in epoch milliseconds; unparseable values count as zero.
    pub fn created_millis(&self) -> i64 {
        parse_millis(&self.created_at).unwrap_or(0)
    }

    pub fn has_assignee(&self, assignee_id: &str) -> bool {
        self.assignees.iter().any(|a| a.id == assignee_id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal published task used across the module tests.
    pub fn task(id: &str, status: &str) -> Task {
        Task {
            id: id.to_string(),
            project_id: "p1".to_string(),
            title: format!("Task {id}"),
            description: None,
            status: status.to_string(),
            visibility: Visibility::Published,
            start_date: None,
            due_date: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            assignees: Vec::new(),
        }
    }

    pub fn due(mut t: Task, due: Option<&str>) -> Task {
        t.due_date = due.map(str::to_string);
        t
    }

    pub fn assignee(id: &str) -> Assignee {
        Assignee {
            id: id.to_string(),
            full_name: Some(format!("User {id}")),
            avatar_url: None,
        }
    }
}
