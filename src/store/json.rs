//! File-backed task store.
//!
//! `Database` is the on-disk JSON document (`{ "tasks": [...] }`), written
//! atomically through a temp file and a rename. `JsonStore` wraps it behind
//! the `TaskStore` contract so the CLI and the board can run against a local
//! file the same way they would against the remote service.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fields::{Status, Visibility, VisibilityAction};
use crate::store::error::StoreError;
use crate::store::traits::TaskStore;
use crate::task::Task;

/// In-memory copy of the task file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Database {
    /// Load the database from a JSON file. A missing file is an empty database.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Database::default());
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    /// Save the database using an atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Distinct project ids, sorted.
    pub fn project_ids(&self) -> Vec<String> {
        let ids: BTreeSet<&str> = self.tasks.iter().map(|t| t.project_id.as_str()).collect();
        ids.into_iter().map(str::to_string).collect()
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `TaskStore` backed by a JSON file.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    db: Mutex<Database>,
}

impl JsonStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::load(path)?;
        debug!(path = %path.display(), tasks = db.tasks.len(), "opened task store");
        Ok(JsonStore {
            path: path.to_path_buf(),
            db: Mutex::new(db),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn project_ids(&self) -> Vec<String> {
        self.db.lock().project_ids()
    }

    /// Apply `edit` to one task and persist. The in-memory copy is only
    /// changed once the file has been written.
    fn update(&self, task_id: &str, edit: impl FnOnce(&mut Task) -> Result<bool, StoreError>) -> Result<Task, StoreError> {
        let mut db = self.db.lock();
        let idx = db.position(task_id)?;
        let mut next = db.clone();
        let task = &mut next.tasks[idx];
        if !edit(task)? {
            return Ok(task.clone());
        }
        task.updated_at = now_timestamp();
        next.save(&self.path)?;
        *db = next;
        Ok(db.tasks[idx].clone())
    }
}

#[async_trait]
impl TaskStore for JsonStore {
    async fn list_tasks(&self, project_id: &str, visibility: Visibility) -> Result<Vec<Task>, StoreError> {
        let db = self.db.lock();
        Ok(db
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id && t.visibility == visibility)
            .cloned()
            .collect())
    }

    async fn update_task_status(&self, task_id: &str, status: Status) -> Result<Task, StoreError> {
        self.update(task_id, |task| {
            if task.workflow_status() == Some(status) {
                return Ok(false);
            }
            task.set_status(status);
            Ok(true)
        })
    }

    async fn update_task_visibility(&self, task_id: &str, action: VisibilityAction) -> Result<Task, StoreError> {
        self.update(task_id, |task| {
            if action == VisibilityAction::Archive && task.visibility == Visibility::Trashed {
                return Err(StoreError::Validation("a trashed task cannot be archived".to_string()));
            }
            if task.visibility == action.target() {
                return Ok(false);
            }
            task.visibility = action.target();
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::fixtures::task;

    fn seeded(dir: &Path) -> PathBuf {
        let path = dir.join("tasks.json");
        let mut other = task("t3", "done");
        other.project_id = "p2".to_string();
        let db = Database {
            tasks: vec![task("t1", "to_start"), task("t2", "pending"), other],
        };
        db.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_list_is_scoped_by_project_and_visibility() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(&seeded(dir.path())).unwrap();
        let tasks = store.list_tasks("p1", Visibility::Published).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(store.list_tasks("p1", Visibility::Archived).await.unwrap().is_empty());
        assert_eq!(store.project_ids(), vec!["p1".to_string(), "p2".to_string()]);
    }

    #[tokio::test]
    async fn test_status_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded(dir.path());
        let store = JsonStore::open(&path).unwrap();

        let updated = store.update_task_status("t1", Status::Done).await.unwrap();
        assert_eq!(updated.workflow_status(), Some(Status::Done));
        assert_ne!(updated.updated_at, "2024-01-01T00:00:00Z");

        let reloaded = Database::load(&path).unwrap();
        assert_eq!(reloaded.get("t1").unwrap().status, "done");
    }

    #[tokio::test]
    async fn test_repeated_status_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(&seeded(dir.path())).unwrap();
        let same = store.update_task_status("t2", Status::Pending).await.unwrap();
        assert_eq!(same.updated_at, "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(&seeded(dir.path())).unwrap();
        let err = store.update_task_status("nope", Status::Done).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_visibility_rules() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(&seeded(dir.path())).unwrap();

        let trashed = store.update_task_visibility("t1", VisibilityAction::Trash).await.unwrap();
        assert_eq!(trashed.visibility, Visibility::Trashed);

        let err = store.update_task_visibility("t1", VisibilityAction::Archive).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let restored = store.update_task_visibility("t1", VisibilityAction::Restore).await.unwrap();
        assert_eq!(restored.visibility, Visibility::Published);
    }

    #[test]
    fn test_missing_file_is_empty_and_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Database::load(&dir.path().join("absent.json")).unwrap().tasks.is_empty());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert!(matches!(Database::load(&corrupt), Err(StoreError::Json(_))));
    }
}
