//! Task filtering.
//!
//! `FilterState` is the user-held, declarative description of which tasks to
//! show. `FilterPredicate` is its compiled form: bounds parsed and the search
//! term normalised once, then applied to every task.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::fields::Status;
use crate::task::{Assignee, Task};

/// Filter selections held by the list view.
///
/// Empty status or assignee sets mean "no restriction", not "match nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub statuses: BTreeSet<Status>,
    pub assignee_ids: BTreeSet<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub search: String,
    pub include_without_date: bool,
}

impl FilterState {
    /// True when no rule restricts the result.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.assignee_ids.is_empty()
            && self.from.is_none()
            && self.to.is_none()
            && self.search.trim().is_empty()
    }
}

/// Compiled form of a `FilterState`.
#[derive(Debug, Clone)]
pub struct FilterPredicate<'a> {
    statuses: &'a BTreeSet<Status>,
    assignee_ids: &'a BTreeSet<String>,
    range: Option<DateRange>,
    include_without_date: bool,
    search: String,
}

impl<'a> FilterPredicate<'a> {
    pub fn new(filter: &'a FilterState) -> Self {
        FilterPredicate {
            statuses: &filter.statuses,
            assignee_ids: &filter.assignee_ids,
            range: DateRange::from_bounds(filter.from.as_deref(), filter.to.as_deref()),
            include_without_date: filter.include_without_date,
            search: filter.search.trim().to_lowercase(),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if !self.statuses.is_empty() {
            match task.workflow_status() {
                Some(status) if self.statuses.contains(&status) => {}
                _ => return false,
            }
        }

        if !self.assignee_ids.is_empty()
            && !task.assignees.iter().any(|a| self.assignee_ids.contains(&a.id))
        {
            return false;
        }

        if let Some(range) = &self.range {
            match DateRange::from_bounds(task.start_date.as_deref(), task.due_date.as_deref()) {
                None if !self.include_without_date => return false,
                None => {}
                Some(task_range) if !task_range.overlaps(range) => return false,
                Some(_) => {}
            }
        }

        if !self.search.is_empty() {
            let title = task.title.to_lowercase();
            let description = task.description.as_deref().unwrap_or("").to_lowercase();
            if !title.contains(&self.search) && !description.contains(&self.search) {
                return false;
            }
        }

        true
    }
}

/// Whether `task` passes every rule of `filter`.
pub fn matches(task: &Task, filter: &FilterState) -> bool {
    FilterPredicate::new(filter).matches(task)
}

/// Keep the tasks that pass `filter`, in their original order.
pub fn apply_filters<'t>(tasks: &[&'t Task], filter: &FilterState) -> Vec<&'t Task> {
    let predicate = FilterPredicate::new(filter);
    tasks.iter().copied().filter(|t| predicate.matches(t)).collect()
}

/// An entry of the assignee picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssigneeOption {
    pub id: String,
    pub name: String,
}

const UNNAMED: &str = "Unnamed";

/// Every assignee that can be filtered on: those found on `tasks` plus the
/// `extra` project members. Later entries override earlier names. Sorted by
/// name, then id.
pub fn assignee_options<'a>(
    tasks: &[Task],
    extra: impl IntoIterator<Item = &'a Assignee>,
) -> Vec<AssigneeOption> {
    let mut names: BTreeMap<String, String> = BTreeMap::new();
    let mut record = |a: &Assignee| {
        let name = a.full_name.clone().unwrap_or_else(|| UNNAMED.to_string());
        names.insert(a.id.clone(), name);
    };
    tasks.iter().flat_map(|t| t.assignees.iter()).for_each(&mut record);
    extra.into_iter().for_each(&mut record);

    let mut options: Vec<AssigneeOption> = names
        .into_iter()
        .map(|(id, name)| AssigneeOption { id, name })
        .collect();
    options.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.id.cmp(&b.id)));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::fixtures::{assignee, due, task};
    use proptest::prelude::*;

    fn dated(start: Option<&str>, due_date: Option<&str>) -> Task {
        let mut t = task("t", "to_start");
        t.start_date = start.map(str::to_string);
        t.due_date = due_date.map(str::to_string);
        t
    }

    fn range(from: Option<&str>, to: Option<&str>) -> FilterState {
        FilterState {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            ..FilterState::default()
        }
    }

    #[test]
    fn test_overlapping_ranges_included() {
        let t = dated(Some("2024-01-10"), Some("2024-01-20"));
        assert!(matches(&t, &range(Some("2024-01-15"), Some("2024-01-25"))));
        assert!(!matches(&t, &range(Some("2024-01-21"), Some("2024-01-25"))));
    }

    #[test]
    fn test_undated_task_depends_on_include_without_date() {
        let t = dated(None, None);
        let mut f = range(Some("2024-01-01"), None);
        assert!(!matches(&t, &f));
        f.include_without_date = true;
        assert!(matches(&t, &f));
    }

    #[test]
    fn test_single_task_date_is_a_point() {
        let t = dated(None, Some("2024-01-15"));
        assert!(matches(&t, &range(Some("2024-01-15"), None)));
        assert!(matches(&t, &range(Some("2024-01-01"), Some("2024-01-31"))));
        assert!(!matches(&t, &range(Some("2024-01-16"), Some("2024-01-31"))));
    }

    #[test]
    fn test_malformed_task_dates_count_as_undated() {
        let t = dated(Some("someday"), Some("never"));
        let mut f = range(Some("2024-01-01"), Some("2024-12-31"));
        assert!(!matches(&t, &f));
        f.include_without_date = true;
        assert!(matches(&t, &f));
    }

    #[test]
    fn test_malformed_filter_bounds_disable_date_rule() {
        let t = dated(None, None);
        assert!(matches(&t, &range(Some("bogus"), None)));
    }

    #[test]
    fn test_status_and_assignee_rules() {
        let mut t = task("t", "pending");
        t.assignees = vec![assignee("u1"), assignee("u2")];

        let mut f = FilterState::default();
        f.statuses.insert(Status::Pending);
        f.assignee_ids.insert("u2".to_string());
        f.assignee_ids.insert("u9".to_string());
        assert!(matches(&t, &f));

        f.statuses = BTreeSet::from([Status::Done]);
        assert!(!matches(&t, &f));

        f.statuses.clear();
        f.assignee_ids = BTreeSet::from(["u9".to_string()]);
        assert!(!matches(&t, &f));
    }

    #[test]
    fn test_unknown_status_never_matches_status_selection() {
        let t = task("t", "archived_junk_status");
        let f = FilterState {
            statuses: Status::ALL.into_iter().collect(),
            ..FilterState::default()
        };
        assert!(!matches(&t, &f));
        assert!(matches(&t, &FilterState::default()));
    }

    #[test]
    fn test_search_is_trimmed_and_case_insensitive() {
        let mut t = task("t", "done");
        t.title = "Deploy Staging".to_string();
        t.description = Some("Rotate the API keys".to_string());

        let mut f = FilterState { search: "  staging ".to_string(), ..FilterState::default() };
        assert!(matches(&t, &f));
        f.search = "api KEYS".to_string();
        assert!(matches(&t, &f));
        f.search = "database".to_string();
        assert!(!matches(&t, &f));

        t.description = None;
        f.search = "rotate".to_string();
        assert!(!matches(&t, &f));
    }

    #[test]
    fn test_is_empty_ignores_blank_search_and_date_opt_in() {
        let mut f = FilterState { search: "   ".to_string(), include_without_date: true, ..FilterState::default() };
        assert!(f.is_empty());
        f.to = Some("2024-01-31".to_string());
        assert!(!f.is_empty());
    }

    #[test]
    fn test_apply_filters_keeps_order() {
        let a = due(task("a", "done"), Some("2024-01-05"));
        let b = task("b", "to_start");
        let c = task("c", "done");
        let tasks = vec![&a, &b, &c];
        let f = FilterState { statuses: BTreeSet::from([Status::Done]), ..FilterState::default() };
        let ids: Vec<&str> = apply_filters(&tasks, &f).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_assignee_options_merge_and_sort() {
        let mut t1 = task("t1", "done");
        t1.assignees = vec![assignee("u2"), Assignee { id: "u3".into(), full_name: None, avatar_url: None }];
        let mut t2 = task("t2", "done");
        t2.assignees = vec![assignee("u1")];
        let members = vec![Assignee { id: "u2".into(), full_name: Some("Ana".into()), avatar_url: None }];

        let options = assignee_options(&[t1, t2], &members);
        let names: Vec<(&str, &str)> = options.iter().map(|o| (o.id.as_str(), o.name.as_str())).collect();
        assert_eq!(names, vec![("u2", "Ana"), ("u3", "Unnamed"), ("u1", "User u1")]);
    }

    proptest! {
        #[test]
        fn prop_empty_filter_matches_everything(
            status in "[a-z_]{0,12}",
            title in ".{1,20}",
            start in proptest::option::of("[0-9-]{0,10}"),
            due_date in proptest::option::of("[0-9-]{0,10}"),
            include_without_date in any::<bool>(),
        ) {
            let mut t = task("t", &status);
            t.title = title;
            t.start_date = start;
            t.due_date = due_date;
            let f = FilterState { include_without_date, ..FilterState::default() };
            prop_assert!(matches(&t, &f));
        }
    }
}
