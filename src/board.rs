//! Board projection.
//!
//! Turns a flat task collection into what the views render: the list view
//! (filtered, then sorted under the user's `SortOption`) and the Kanban board
//! (four fixed status columns with a due-date ordering inside each column).
//! Only published tasks are eligible for either view.

use tracing::trace;

use crate::fields::{SortOption, Status};
use crate::filter::{FilterPredicate, FilterState};
use crate::sort::{sort_column, sort_tasks};
use crate::task::Task;

/// Tasks grouped by status column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board<'t> {
    columns: [Vec<&'t Task>; 4],
}

impl<'t> Board<'t> {
    pub fn column(&self, status: Status) -> &[&'t Task] {
        &self.columns[status.column()]
    }

    /// Columns in board order.
    pub fn columns(&self) -> impl Iterator<Item = (Status, &[&'t Task])> {
        Status::ALL.into_iter().map(move |s| (s, self.column(s)))
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// Column and row of a task, if it is on the board.
    pub fn position(&self, task_id: &str) -> Option<(Status, usize)> {
        self.columns()
            .find_map(|(status, tasks)| tasks.iter().position(|t| t.id == task_id).map(|row| (status, row)))
    }
}

/// Published tasks, in input order.
pub fn published(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| t.is_published()).collect()
}

/// List view: filter then sort the published tasks.
pub fn project_list<'t>(tasks: &'t [Task], filter: &FilterState, sort: SortOption) -> Vec<&'t Task> {
    let predicate = FilterPredicate::new(filter);
    let visible: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.is_published() && predicate.matches(t))
        .collect();
    sort_tasks(&visible, sort)
}

/// Board view: bucket every published task by status. Filters and sort
/// options do not apply here. Tasks with an unknown status are left out.
pub fn project_board(tasks: &[Task]) -> Board<'_> {
    let mut board = Board::default();
    for task in published(tasks) {
        match task.workflow_status() {
            Some(status) => board.columns[status.column()].push(task),
            None => trace!(task_id = %task.id, status = %task.status, "dropping task with unknown status"),
        }
    }
    for column in board.columns.iter_mut() {
        sort_column(column);
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Visibility;
    use crate::task::fixtures::{due, task};
    use std::collections::BTreeSet;

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_unknown_status_is_dropped() {
        let tasks = vec![
            task("a", "to_start"),
            task("b", "done"),
            task("c", "archived_junk_status"),
        ];
        let board = project_board(&tasks);
        assert_eq!(board.total(), 2);
        assert_eq!(ids(board.column(Status::ToStart)), vec!["a"]);
        assert_eq!(ids(board.column(Status::Done)), vec!["b"]);
        assert!(board.columns().all(|(_, col)| col.iter().all(|t| t.id != "c")));
        assert_eq!(board.position("c"), None);
    }

    #[test]
    fn test_board_ignores_filters_and_orders_by_due() {
        let tasks = vec![
            due(task("a", "pending"), None),
            due(task("b", "pending"), Some("2024-06-01")),
            due(task("c", "pending"), Some("2024-05-01")),
            due(task("d", "pending"), Some("junk")),
        ];
        let board = project_board(&tasks);
        assert_eq!(ids(board.column(Status::Pending)), vec!["c", "b", "a", "d"]);
        assert_eq!(board.position("b"), Some((Status::Pending, 1)));
    }

    #[test]
    fn test_non_published_tasks_are_not_projected() {
        let mut archived = task("x", "done");
        archived.visibility = Visibility::Archived;
        let tasks = vec![archived, task("y", "done")];

        assert_eq!(project_board(&tasks).total(), 1);
        let list = project_list(&tasks, &FilterState::default(), SortOption::default());
        assert_eq!(ids(&list), vec!["y"]);
    }

    #[test]
    fn test_list_view_filters_then_sorts() {
        let tasks = vec![
            due(task("a", "done"), Some("2024-03-01")),
            due(task("b", "to_start"), Some("2024-01-01")),
            due(task("c", "done"), None),
            due(task("d", "done"), Some("2024-02-01")),
        ];
        let filter = FilterState { statuses: BTreeSet::from([Status::Done]), ..FilterState::default() };
        let list = project_list(&tasks, &filter, SortOption::DueDateAsc);
        assert_eq!(ids(&list), vec!["d", "a", "c"]);
    }
}
