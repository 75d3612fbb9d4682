//! # tb - task board CLI
//!
//! Filters, sorts and moves the tasks of a project, either from the command
//! line or through an interactive Kanban board.
//!
//! ## Quick Start
//!
//! ```bash
//! # Open the board for the first project in ~/.taskboard/tasks.json
//! tb ui
//!
//! # Published tasks due in March, or without any date, soonest first
//! tb list --from 2024-03-01 --to 2024-03-31 --include-without-date --sort due_date_asc
//!
//! # The same view from a saved query string
//! tb list --query "from=2024-03-01&to=2024-03-31&includeWithoutDate=1&sort=due_date_asc"
//!
//! # Move a task to another column
//! tb move t-42 in_progress
//! ```
//!
//! Data is read from `~/.taskboard/tasks.json` unless `--db` or `TASKBOARD_DB`
//! points elsewhere. Set `RUST_LOG` to see what the store and the board do;
//! while the board is open, logs go to `taskboard.log` next to the task file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use taskboard::config::{log_path, resolve_db_path};

mod cli;
mod cmd;

use cli::Cli;
use cmd::Commands;

/// Log to stderr, or to a file while the terminal belongs to the board.
fn init_logging(db_path: &Path, to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    if to_file {
        match OpenOptions::new().create(true).append(true).open(log_path(db_path)) {
            Ok(file) => {
                registry
                    .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                    .init();
                return;
            }
            Err(e) => eprintln!("Failed to open log file: {}", e),
        }
    }
    registry.with(fmt::layer().with_writer(std::io::stderr)).init();
}

fn main() {
    let cli = Cli::parse();

    let db_path = match resolve_db_path(cli.db.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Failed to create task directory: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&db_path, matches!(cli.command, Commands::Ui { .. }));

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = cmd::run(cli, &db_path, &runtime) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
