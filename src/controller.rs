//! Optimistic board transitions.
//!
//! A move is applied to the local task collection before the storage call is
//! issued, so the board reflects it immediately. Each move is captured as a
//! `Transition` holding the full collection before and after the change. When
//! the remote call fails the `before` snapshot is restored as a whole, which
//! also discards any other optimistic edit made in the meantime.
//!
//! The controller is cheap to clone; clones share the same board state and
//! can be moved into spawned tasks.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::BoardConfig;
use crate::fields::{Status, Visibility, VisibilityAction};
use crate::store::{StoreError, TaskStore};
use crate::task::Task;

/// Full copy of the task collection at a given local version.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub version: u64,
}

/// What a transition changes on its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Status { from: Status, to: Status },
    Visibility { from: Visibility, action: VisibilityAction },
}

/// An optimistic change that has been applied locally and awaits the store.
#[derive(Debug, Clone)]
pub struct Transition {
    pub task_id: String,
    pub change: Change,
    pub before: Snapshot,
    pub after: Snapshot,
}

/// Result of a move once the store has answered.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing to do: same column, same visibility or unknown task.
    Unchanged,
    /// The store accepted the change.
    Confirmed(Task),
    /// The store refused or failed; the pre-transition snapshot is back.
    RolledBack(StoreError),
}

impl Outcome {
    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Outcome::RolledBack(_))
    }
}

#[derive(Debug, Default)]
struct BoardState {
    tasks: Vec<Task>,
    version: u64,
    highlight: Option<(String, Instant)>,
    refresh_requested: bool,
}

impl BoardState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            version: self.version,
        }
    }
}

/// Single writer of the board's task collection.
#[derive(Clone)]
pub struct TransitionController {
    store: Arc<dyn TaskStore>,
    state: Arc<Mutex<BoardState>>,
    config: BoardConfig,
}

impl TransitionController {
    pub fn new(store: Arc<dyn TaskStore>, tasks: Vec<Task>, config: BoardConfig) -> Self {
        TransitionController {
            store,
            state: Arc::new(Mutex::new(BoardState {
                tasks,
                ..BoardState::default()
            })),
            config,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot()
    }

    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    /// Run `f` against the current tasks without cloning them.
    pub fn with_tasks<R>(&self, f: impl FnOnce(&[Task]) -> R) -> R {
        f(&self.state.lock().tasks)
    }

    /// Replace the collection with fresh data from the store.
    pub fn replace_tasks(&self, tasks: Vec<Task>) {
        let mut state = self.state.lock();
        state.tasks = tasks;
        state.version += 1;
    }

    /// Reload the published tasks of `project_id`.
    pub async fn refresh(&self, project_id: &str) -> Result<(), StoreError> {
        let tasks = self.store.list_tasks(project_id, Visibility::Published).await?;
        debug!(project_id, tasks = tasks.len(), "refreshed board");
        self.replace_tasks(tasks);
        Ok(())
    }

    /// Whether a confirmed transition asked for server data to be reloaded.
    /// Reading the flag clears it.
    pub fn take_refresh_request(&self) -> bool {
        std::mem::take(&mut self.state.lock().refresh_requested)
    }

    /// Task highlighted after a confirmed move, while its window is open.
    pub fn highlighted(&self, now: Instant) -> Option<String> {
        let state = self.state.lock();
        match &state.highlight {
            Some((id, until)) if now < *until => Some(id.clone()),
            _ => None,
        }
    }

    /// Drop the highlight marker once its window has passed.
    pub fn clear_expired_highlight(&self, now: Instant) {
        let mut state = self.state.lock();
        if matches!(&state.highlight, Some((_, until)) if now >= *until) {
            state.highlight = None;
        }
    }

    /// Apply `edit` to a task optimistically and capture the transition.
    fn begin(&self, task_id: &str, change: Change, edit: impl FnOnce(&mut Task)) -> Option<Transition> {
        let mut state = self.state.lock();
        let Some(idx) = state.tasks.iter().position(|t| t.id == task_id) else {
            debug!(task_id, "task is not on the board, ignoring transition");
            return None;
        };

        let before = state.snapshot();
        edit(&mut state.tasks[idx]);
        state.version += 1;
        let after = state.snapshot();
        debug!(task_id, ?change, version = after.version, "applied optimistic change");

        Some(Transition {
            task_id: task_id.to_string(),
            change,
            before,
            after,
        })
    }

    /// Start a status move. `None` when there is nothing to move.
    pub fn begin_move(&self, task_id: &str, from: Status, to: Status) -> Option<Transition> {
        if from == to {
            return None;
        }
        self.begin(task_id, Change::Status { from, to }, |task| task.set_status(to))
    }

    /// Start a visibility change. `None` when the task already has the target
    /// visibility or is unknown.
    pub fn begin_visibility(&self, task_id: &str, action: VisibilityAction) -> Option<Transition> {
        let from = self.with_tasks(|tasks| tasks.iter().find(|t| t.id == task_id).map(|t| t.visibility))?;
        if from == action.target() {
            return None;
        }
        self.begin(task_id, Change::Visibility { from, action }, |task| {
            task.visibility = action.target()
        })
    }

    /// Settle a transition with the store's answer.
    pub fn resolve(&self, transition: Transition, result: Result<Task, StoreError>, now: Instant) -> Outcome {
        let mut state = self.state.lock();
        match result {
            Ok(task) => {
                info!(task_id = %transition.task_id, change = ?transition.change, "transition confirmed");
                state.highlight = Some((transition.task_id, now + self.config.highlight));
                state.refresh_requested = true;
                Outcome::Confirmed(task)
            }
            Err(err) => {
                if state.version != transition.after.version {
                    warn!(
                        task_id = %transition.task_id,
                        expected = transition.after.version,
                        current = state.version,
                        "rollback discards newer local changes"
                    );
                }
                state.tasks = transition.before.tasks;
                state.version += 1;
                error!(task_id = %transition.task_id, change = ?transition.change, error = %err, "transition failed, rolled back");
                Outcome::RolledBack(err)
            }
        }
    }

    /// Send an already applied transition to the store and settle it.
    pub async fn complete(&self, transition: Transition) -> Outcome {
        let result = match transition.change {
            Change::Status { to, .. } => self.store.update_task_status(&transition.task_id, to).await,
            Change::Visibility { action, .. } => {
                self.store.update_task_visibility(&transition.task_id, action).await
            }
        };
        self.resolve(transition, result, Instant::now())
    }

    /// Move a task to another status column.
    pub async fn move_task(&self, task_id: &str, from: Status, to: Status) -> Outcome {
        match self.begin_move(task_id, from, to) {
            Some(transition) => self.complete(transition).await,
            None => Outcome::Unchanged,
        }
    }

    /// Archive, restore or trash a task.
    pub async fn change_visibility(&self, task_id: &str, action: VisibilityAction) -> Outcome {
        match self.begin_visibility(task_id, action) {
            Some(transition) => self.complete(transition).await,
            None => Outcome::Unchanged,
        }
    }
}
