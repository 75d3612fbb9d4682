//! Runtime configuration: where the task file lives and how the board behaves.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a successfully moved card stays highlighted.
pub const DEFAULT_HIGHLIGHT_MS: u64 = 800;

const DATA_DIR_NAME: &str = ".taskboard";
const DB_FILE_NAME: &str = "tasks.json";
const LOG_FILE_NAME: &str = "taskboard.log";

/// Settings for the optimistic board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub highlight: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            highlight: Duration::from_millis(DEFAULT_HIGHLIGHT_MS),
        }
    }
}

impl BoardConfig {
    pub fn with_highlight_ms(ms: u64) -> Self {
        BoardConfig {
            highlight: Duration::from_millis(ms),
        }
    }
}

/// Resolve the task file. An explicit path wins; otherwise
/// `$HOME/.taskboard/tasks.json`, creating the directory if needed.
pub fn resolve_db_path(explicit: Option<&Path>) -> io::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let dir = PathBuf::from(home).join(DATA_DIR_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(DB_FILE_NAME))
}

/// Log file used while the terminal is owned by the board UI.
pub fn log_path(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(LOG_FILE_NAME)
}
