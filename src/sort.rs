//! Task ordering for the list view and for board columns.

use std::cmp::Ordering;

use crate::fields::SortOption;
use crate::task::Task;

/// Compare two tasks under `option`. `Equal` means "keep input order".
pub fn compare(a: &Task, b: &Task, option: SortOption) -> Ordering {
    match option {
        SortOption::CreatedAtDesc => b.created_millis().cmp(&a.created_millis()),
        SortOption::CreatedAtAsc => a.created_millis().cmp(&b.created_millis()),
        SortOption::DueDateAsc => compare_due(a.due_millis(), b.due_millis(), false),
        SortOption::DueDateDesc => compare_due(a.due_millis(), b.due_millis(), true),
    }
}

/// Tasks without a due date sink to the end in both directions.
fn compare_due(a: Option<i64>, b: Option<i64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorted copy of `tasks`. Ties keep their relative input order.
pub fn sort_tasks<'t>(tasks: &[&'t Task], option: SortOption) -> Vec<&'t Task> {
    let mut keyed: Vec<(usize, &'t Task)> = tasks.iter().copied().enumerate().collect();
    keyed.sort_by(|(ia, a), (ib, b)| compare(a, b, option).then(ia.cmp(ib)));
    keyed.into_iter().map(|(_, t)| t).collect()
}

/// Fixed board-column ordering: dated tasks first by ascending due date, then
/// undated tasks, each group in input order.
pub fn sort_column(tasks: &mut [&Task]) {
    tasks.sort_by(|a, b| compare_due(a.due_millis(), b.due_millis(), false));
}
