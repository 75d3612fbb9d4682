use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Task list and Kanban board over a JSON task file.
/// Storage defaults to ~/.taskboard/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tb", version, about = "Filter, sort and move project tasks")]
pub struct Cli {
    /// Path to the JSON task file.
    #[arg(long, global = true, env = "TASKBOARD_DB")]
    pub db: Option<PathBuf>,

    /// Project to work on. Defaults to the first project in the task file.
    #[arg(long, global = true, env = "TASKBOARD_PROJECT")]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
