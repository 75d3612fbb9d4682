//! Enumerations and field types for task management.
//!
//! This module defines the structured values used to classify tasks and drive
//! the views: workflow status, lifecycle visibility, visibility actions and the
//! list sort options.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Workflow status of a task. Each status owns one board column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Status {
    ToStart,
    InProgress,
    Pending,
    Done,
}

impl Status {
    /// Board column order.
    pub const ALL: [Status; 4] = [Status::ToStart, Status::InProgress, Status::Pending, Status::Done];

    /// Wire name, as stored and as written to the query string.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::ToStart => "to_start",
            Status::InProgress => "in_progress",
            Status::Pending => "pending",
            Status::Done => "done",
        }
    }

    /// Parse a wire name. Anything outside the four known values is `None`.
    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "to_start" => Some(Status::ToStart),
            "in_progress" => Some(Status::InProgress),
            "pending" => Some(Status::Pending),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    /// Position of the status column on the board.
    pub fn column(self) -> usize {
        match self {
            Status::ToStart => 0,
            Status::InProgress => 1,
            Status::Pending => 2,
            Status::Done => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::ToStart => "To Start",
            Status::InProgress => "In Progress",
            Status::Pending => "Pending",
            Status::Done => "Done",
        }
    }
}

/// Lifecycle axis of a task, independent of its status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Published,
    Archived,
    Trashed,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Published => "published",
            Visibility::Archived => "archived",
            Visibility::Trashed => "trashed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Visibility::Published => "Active",
            Visibility::Archived => "Archived",
            Visibility::Trashed => "Trashed",
        }
    }
}

/// Visibility change requested by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityAction {
    Archive,
    Restore,
    Trash,
}

impl VisibilityAction {
    /// Visibility a task ends up with once the action succeeds.
    pub fn target(self) -> Visibility {
        match self {
            VisibilityAction::Archive => Visibility::Archived,
            VisibilityAction::Restore => Visibility::Published,
            VisibilityAction::Trash => Visibility::Trashed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VisibilityAction::Archive => "archive",
            VisibilityAction::Restore => "restore",
            VisibilityAction::Trash => "trash",
        }
    }
}

/// Available orderings for the task list view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    CreatedAtDesc,
    CreatedAtAsc,
    DueDateAsc,
    DueDateDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 4] = [
        SortOption::CreatedAtDesc,
        SortOption::CreatedAtAsc,
        SortOption::DueDateAsc,
        SortOption::DueDateDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::CreatedAtDesc => "created_at_desc",
            SortOption::CreatedAtAsc => "created_at_asc",
            SortOption::DueDateAsc => "due_date_asc",
            SortOption::DueDateDesc => "due_date_desc",
        }
    }

    pub fn parse(s: &str) -> Option<SortOption> {
        SortOption::ALL.into_iter().find(|o| o.as_str() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOption::CreatedAtDesc => "Created (newest)",
            SortOption::CreatedAtAsc => "Created (oldest)",
            SortOption::DueDateAsc => "Due (soonest)",
            SortOption::DueDateDesc => "Due (latest)",
        }
    }
}
