//! Command implementations for the CLI interface.
//!
//! Each subcommand opens the JSON task store, works out the project, and
//! drives the library: list and board projections, the query-string codec,
//! and optimistic moves through the transition controller.

use std::path::Path;
use std::sync::Arc;

use clap::{Args, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use tokio::runtime::Runtime;

use taskboard::board::{project_board, project_list};
use taskboard::config::{BoardConfig, DEFAULT_HIGHLIGHT_MS};
use taskboard::controller::{Outcome, TransitionController};
use taskboard::dates::{utc_today, DueIndicator};
use taskboard::fields::{SortOption, Status, Visibility, VisibilityAction};
use taskboard::filter::FilterState;
use taskboard::query::{decode, encode, QueryParams};
use taskboard::store::{JsonStore, StoreError, TaskStore};
use taskboard::task::Task;
use taskboard::tui::run::run_board_tui;

use crate::cli::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive Kanban board.
    Ui {
        /// How long a moved card stays highlighted, in milliseconds.
        #[arg(long, default_value_t = DEFAULT_HIGHLIGHT_MS)]
        highlight_ms: u64,
    },

    /// List published tasks with filters and sorting.
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show the four status columns.
    Board,

    /// Print the query string for a filter/sort state.
    Query {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Move a task to another status column.
    Move {
        /// Task ID.
        id: String,
        /// Target status: to_start | in_progress | pending | done.
        #[arg(value_enum)]
        status: Status,
    },

    /// Archive a task.
    Archive {
        /// Task ID.
        id: String,
    },

    /// Restore an archived or trashed task.
    Restore {
        /// Task ID.
        id: String,
    },

    /// Move a task to the trash.
    Trash {
        /// Task ID.
        id: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Filter and sort flags, layered over an optional query string.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Starting query string, e.g. "status=done&sort=due_date_asc".
    #[arg(long)]
    pub query: Option<String>,
    /// Status filter. May be repeated and comma-separated.
    #[arg(long = "status", value_enum, value_delimiter = ',')]
    pub statuses: Vec<Status>,
    /// Assignee ID filter. May be repeated and comma-separated.
    #[arg(long = "assignee", value_delimiter = ',')]
    pub assignees: Vec<String>,
    /// Start of the date range (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<String>,
    /// End of the date range (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<String>,
    /// Case-insensitive text searched in titles and descriptions.
    #[arg(long)]
    pub search: Option<String>,
    /// Keep tasks without dates when a date range is set.
    #[arg(long)]
    pub include_without_date: bool,
    /// Sort order.
    #[arg(long, value_enum)]
    pub sort: Option<SortOption>,
}

impl FilterArgs {
    /// Decode `--query`, then let explicit flags override it.
    pub fn resolve(&self) -> (QueryParams, FilterState, SortOption) {
        let params = QueryParams::parse(self.query.as_deref().unwrap_or(""));
        let (mut filter, mut sort) = decode(&params);

        if !self.statuses.is_empty() {
            filter.statuses = self.statuses.iter().copied().collect();
        }
        if !self.assignees.is_empty() {
            filter.assignee_ids = self.assignees.iter().map(|a| a.trim().to_string()).collect();
        }
        if let Some(from) = &self.from {
            filter.from = Some(from.clone());
        }
        if let Some(to) = &self.to {
            filter.to = Some(to.clone());
        }
        if let Some(search) = &self.search {
            filter.search = search.clone();
        }
        if self.include_without_date {
            filter.include_without_date = true;
        }
        if let Some(s) = self.sort {
            sort = s;
        }
        (params, filter, sort)
    }
}

/// Pick the project: the explicit one, or the first project in the file.
fn resolve_project(store: &JsonStore, explicit: Option<&str>) -> Result<String, StoreError> {
    if let Some(project) = explicit {
        return Ok(project.to_string());
    }
    store.project_ids().into_iter().next().ok_or_else(|| {
        StoreError::Validation(format!("no projects found in {}", store.path().display()))
    })
}

/// Open the store and load the published tasks of the selected project.
async fn load(db_path: &Path, project: Option<&str>) -> Result<(Arc<JsonStore>, String, Vec<Task>), StoreError> {
    let store = Arc::new(JsonStore::open(db_path)?);
    let project_id = resolve_project(&store, project)?;
    let tasks = store.list_tasks(&project_id, Visibility::Published).await?;
    Ok((store, project_id, tasks))
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli, db_path: &Path, runtime: &Runtime) -> Result<(), StoreError> {
    let project = cli.project.as_deref();
    match cli.command {
        Commands::Ui { highlight_ms } => cmd_ui(db_path, project, highlight_ms, runtime),
        Commands::List { filters } => runtime.block_on(cmd_list(db_path, project, &filters)),
        Commands::Board => runtime.block_on(cmd_board(db_path, project)),
        Commands::Query { filters } => {
            cmd_query(&filters);
            Ok(())
        }
        Commands::Move { id, status } => runtime.block_on(cmd_move(db_path, project, &id, status)),
        Commands::Archive { id } => runtime.block_on(cmd_visibility(db_path, project, &id, VisibilityAction::Archive)),
        Commands::Restore { id } => runtime.block_on(cmd_visibility(db_path, project, &id, VisibilityAction::Restore)),
        Commands::Trash { id } => runtime.block_on(cmd_visibility(db_path, project, &id, VisibilityAction::Trash)),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

pub fn cmd_ui(db_path: &Path, project: Option<&str>, highlight_ms: u64, runtime: &Runtime) -> Result<(), StoreError> {
    let (store, project_id, tasks) = runtime.block_on(load(db_path, project))?;
    let controller = TransitionController::new(store, tasks, BoardConfig::with_highlight_ms(highlight_ms));
    run_board_tui(controller, project_id, runtime.handle().clone())?;
    Ok(())
}

pub async fn cmd_list(db_path: &Path, project: Option<&str>, filters: &FilterArgs) -> Result<(), StoreError> {
    let (_, project_id, tasks) = load(db_path, project).await?;
    let (params, filter, sort) = filters.resolve();

    let rows = project_list(&tasks, &filter, sort);
    println!("Project: {project_id}  Sort: {}", sort.label());
    print_table(&rows);
    if filter.is_empty() {
        println!("{} tasks", rows.len());
    } else {
        println!("{} of {} tasks match the filters", rows.len(), tasks.len());
    }
    println!("?{}", encode(&params, &filter, sort));
    Ok(())
}

pub async fn cmd_board(db_path: &Path, project: Option<&str>) -> Result<(), StoreError> {
    let (_, project_id, tasks) = load(db_path, project).await?;
    let board = project_board(&tasks);
    let today = utc_today();

    println!("Project: {project_id}  Tasks on board: {}", board.total());
    for (status, column) in board.columns() {
        println!();
        println!("{} ({})", status.label(), column.len());
        for t in column {
            let due = DueIndicator::for_due(t.due_date.as_deref(), today)
                .map(|d| d.label())
                .unwrap_or_default();
            println!("  {:<10} {:<14} {}", truncate(&t.id, 10), due, t.title);
        }
    }
    Ok(())
}

pub fn cmd_query(filters: &FilterArgs) {
    let (params, filter, sort) = filters.resolve();
    let encoded = encode(&params, &filter, sort);
    println!("?{}", encoded);
    for (key, value) in encoded.iter() {
        println!("  {:<20} {}", key, value);
    }
}

pub async fn cmd_move(db_path: &Path, project: Option<&str>, id: &str, status: Status) -> Result<(), StoreError> {
    let (store, _, tasks) = load(db_path, project).await?;
    let from = current_status(&tasks, id)?;
    let controller = TransitionController::new(store, tasks, BoardConfig::default());

    match controller.move_task(id, from, status).await {
        Outcome::Unchanged => println!("Task {id} is already in {}", status.label()),
        Outcome::Confirmed(task) => println!("Moved task {}: {} -> {}", task.id, from.label(), status.label()),
        Outcome::RolledBack(err) => {
            eprintln!("Move reverted, task {id} stays in {}", from.label());
            return Err(err);
        }
    }
    Ok(())
}

pub async fn cmd_visibility(
    db_path: &Path,
    project: Option<&str>,
    id: &str,
    action: VisibilityAction,
) -> Result<(), StoreError> {
    let store = Arc::new(JsonStore::open(db_path)?);
    let project_id = resolve_project(&store, project)?;

    // Restoring works on hidden tasks, so the whole project is loaded here.
    let mut tasks = Vec::new();
    for visibility in [Visibility::Published, Visibility::Archived, Visibility::Trashed] {
        tasks.extend(store.list_tasks(&project_id, visibility).await?);
    }
    if !tasks.iter().any(|t| t.id == id) {
        return Err(StoreError::NotFound(id.to_string()));
    }

    let controller = TransitionController::new(store, tasks, BoardConfig::default());
    match controller.change_visibility(id, action).await {
        Outcome::Unchanged => println!("Task {id} is already {}", action.target().label().to_lowercase()),
        Outcome::Confirmed(task) => println!("Task {}: {}", task.id, task.visibility.label()),
        Outcome::RolledBack(err) => return Err(err),
    }
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "tb", &mut std::io::stdout());
}

fn current_status(tasks: &[Task], id: &str) -> Result<Status, StoreError> {
    let task = tasks
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    task.workflow_status()
        .ok_or_else(|| StoreError::Validation(format!("task {id} has unknown status '{}'", task.status)))
}

/// Print tasks in a formatted table.
fn print_table(tasks: &[&Task]) {
    println!(
        "{:<10} {:<12} {:<11} {:<11} {:<18} {}",
        "ID", "Status", "Start", "Due", "Assignees", "Title"
    );
    for t in tasks {
        let status = t.workflow_status().map(|s| s.label()).unwrap_or("-");
        let names: Vec<&str> = t
            .assignees
            .iter()
            .map(|a| a.full_name.as_deref().unwrap_or(a.id.as_str()))
            .collect();
        let assignees = if names.is_empty() { "-".to_string() } else { names.join(", ") };
        println!(
            "{:<10} {:<12} {:<11} {:<11} {:<18} {}",
            truncate(&t.id, 10),
            status,
            t.start_date.as_deref().unwrap_or("-"),
            t.due_date.as_deref().unwrap_or("-"),
            truncate(&assignees, 18),
            t.title
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-much-longer-id", 6), "a-muc…");
    }

    #[test]
    fn test_flags_override_query() {
        let args = FilterArgs {
            query: Some("status=done&search=old&tab=list&sort=due_date_desc".to_string()),
            statuses: vec![Status::Pending, Status::ToStart],
            search: Some("new".to_string()),
            ..FilterArgs::default()
        };
        let (params, filter, sort) = args.resolve();
        assert_eq!(filter.statuses, BTreeSet::from([Status::ToStart, Status::Pending]));
        assert_eq!(filter.search, "new");
        assert_eq!(sort, SortOption::DueDateDesc);
        assert_eq!(
            encode(&params, &filter, sort).to_string(),
            "status=to_start%2Cpending&search=new&tab=list&sort=due_date_desc"
        );
    }

    #[test]
    fn test_current_status_errors() {
        let mut t = taskboard::task::Task {
            id: "t1".into(),
            project_id: "p".into(),
            title: "x".into(),
            description: None,
            status: "weird".into(),
            visibility: Visibility::Published,
            start_date: None,
            due_date: None,
            created_at: String::new(),
            updated_at: String::new(),
            assignees: vec![],
        };
        assert!(matches!(current_status(std::slice::from_ref(&t), "t1"), Err(StoreError::Validation(_))));
        assert!(matches!(current_status(std::slice::from_ref(&t), "t2"), Err(StoreError::NotFound(_))));
        t.status = "done".into();
        assert_eq!(current_status(&[t], "t1").unwrap(), Status::Done);
    }

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }
}
