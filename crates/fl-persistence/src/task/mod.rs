//! Task-file loader: parses line-delimited [`TaskDescriptor`] records.
//! Malformed individual lines are skipped rather than failing the whole
//! file; only the file being unreadable is fatal to the CLI.

use crate::error::PersistenceError;
use fl_domain::task::TaskDescriptor;
use std::path::Path;

pub fn load_tasks(path: impl AsRef<Path>) -> Result<Vec<TaskDescriptor>, PersistenceError> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .map_err(|e| PersistenceError::Io { path: path.display().to_string(), source: e })?;
    let mut tasks = Vec::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Ok(task) = serde_json::from_str::<TaskDescriptor>(line) {
            tasks.push(task);
        } else {
            log::warn!("skipping malformed task record in {}", path.display());
        }
    }
    Ok(tasks)
}
