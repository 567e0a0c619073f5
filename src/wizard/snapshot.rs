//! Project files.
//!
//! A project file is a pretty-printed JSON dump of [`ProjectState`]. There is
//! no schema version; top-level keys are optional on load, so a file missing
//! data loads fine and fails later at the operation that needs the data.
//! Credentials and session history are not part of the state and never reach
//! the file.

use std::path::Path;

use super::error::SnapshotError;
use super::schema::Plan;
use super::state::ProjectState;

/// Serialize a project state.
pub fn to_json(state: &ProjectState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Deserialize a project state.
pub fn from_json(text: &str) -> Result<ProjectState, SnapshotError> {
    Ok(serde_json::from_str(text)?)
}

/// Write a project file, creating parent directories as needed.
pub fn save(state: &ProjectState, path: &Path) -> Result<(), SnapshotError> {
    write(path, &to_json(state)?)
}

/// Read a project file.
pub fn load(path: &Path) -> Result<ProjectState, SnapshotError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| SnapshotError::Read { path: path.to_path_buf(), source })?;
    from_json(&text)
}

/// Write the plan alone.
pub fn export_plan(plan: &Plan, path: &Path) -> Result<(), SnapshotError> {
    write(path, &serde_json::to_string_pretty(plan)?)
}

fn write(path: &Path, content: &str) -> Result<(), SnapshotError> {
    let to_error = |source| SnapshotError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_error)?;
    }
    std::fs::write(path, content).map_err(to_error)?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote project file");
    Ok(())
}
