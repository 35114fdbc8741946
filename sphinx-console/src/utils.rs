//! Query history persistence

use std::path::PathBuf;

use anyhow::Result;

use crate::app::QueryHistory;

/// Path of the persisted history file.
pub fn history_file_path() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(proj_dirs) = ProjectDirs::from("com", "sphinx-console", "sphinx-console") {
        proj_dirs.data_dir().join("history.json")
    } else {
        PathBuf::from(".sphinx-console-history.json")
    }
}

/// Load query history from disk; a missing or unreadable file yields an
/// empty history.
pub fn load_history() -> QueryHistory {
    let path = history_file_path();
    if let Ok(content) = std::fs::read_to_string(&path) {
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        QueryHistory::default()
    }
}

/// Save query history to disk.
pub fn save_history(history: &QueryHistory) -> Result<()> {
    let path = history_file_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(history)?;
    std::fs::write(path, content)?;
    Ok(())
}
