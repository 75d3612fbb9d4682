//! Storage collaborator contract.

use async_trait::async_trait;

use crate::fields::{Status, Visibility, VisibilityAction};
use crate::store::error::StoreError;
use crate::task::Task;

/// Remote task storage, scoped and authorized on its own side.
///
/// Every mutating call returns the stored task on success. Failures of any
/// kind come back as a `StoreError`, never as a panic.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks of a project with the given visibility.
    async fn list_tasks(&self, project_id: &str, visibility: Visibility) -> Result<Vec<Task>, StoreError>;

    /// Set the workflow status. Repeating a call with the same status is a no-op.
    async fn update_task_status(&self, task_id: &str, status: Status) -> Result<Task, StoreError>;

    /// Archive, restore or trash a task.
    async fn update_task_visibility(&self, task_id: &str, action: VisibilityAction) -> Result<Task, StoreError>;
}
