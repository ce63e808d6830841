//! File-backed [`StateStore`]: one pretty-printed JSON file per project.
//!
//! Saves go through a temp file in the same directory that is renamed over
//! the target, so a crash mid-write leaves the previous file intact.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::contract::{BuildRecord, HarvestError, ProjectState, StateStore};

/// Stores project state under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the state file for `project`.
    pub fn path_for(&self, project: &str) -> PathBuf {
        self.dir.join(format!("{}.json", state_file_stem(project)))
    }
}

/// File-safe stem for a project name.
///
/// ASCII letters, digits, `-` and `.` are kept; every other byte of the UTF-8
/// name (including `_` and `%`) becomes `%XX`. Distinct names therefore never
/// share a state file.
pub fn state_file_stem(project: &str) -> String {
    let mut stem = String::with_capacity(project.len());
    for byte in project.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' => stem.push(byte as char),
            _ => stem.push_str(&format!("%{byte:02X}")),
        }
    }
    stem
}

/// Serialize `value` to `path` atomically (temp file + rename).
fn write_json_atomic<V: Serialize>(path: &Path, value: &V) -> Result<(), HarvestError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;

    let json = serde_json::to_vec_pretty(value).map_err(|e| {
        HarvestError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| HarvestError::io(&dir, e))?;
    tmp.write_all(&json).map_err(|e| HarvestError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| HarvestError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| {
        error!(error = %e.error, path = %path.display(), "Failed to move state file into place");
        HarvestError::io(path, e.error)
    })?;
    Ok(())
}

impl StateStore for JsonFileStore {
    fn load(&self, project: &str) -> Result<ProjectState, HarvestError> {
        let path = self.path_for(project);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(project = %project, path = %path.display(), "No saved state, starting fresh");
                return Ok(ProjectState::default());
            }
            Err(e) => {
                error!(error = ?e, path = %path.display(), "Failed to read state file");
                return Err(HarvestError::io(path, e));
            }
        };

        let state: ProjectState = serde_json::from_str(&content).map_err(|e| {
            error!(error = %e, path = %path.display(), "State file does not parse");
            HarvestError::CorruptState {
                project: project.to_string(),
                reason: e.to_string(),
            }
        })?;

        if let Some(number) = state.ordering_violation() {
            error!(project = %project, build_number = number, "State file builds are not strictly ascending");
            return Err(HarvestError::CorruptState {
                project: project.to_string(),
                reason: format!("builds not strictly ascending at build {number}"),
            });
        }

        debug!(
            project = %project,
            builds = state.builds.len(),
            prev_build_number = state.prev_build_number,
            "Loaded state"
        );
        Ok(state)
    }

    fn save(&self, project: &str, state: &ProjectState) -> Result<(), HarvestError> {
        let path = self.path_for(project);
        write_json_atomic(&path, state)?;
        info!(
            project = %project,
            path = %path.display(),
            builds = state.builds.len(),
            prev_build_number = state.prev_build_number,
            "Saved state"
        );
        Ok(())
    }
}

/// Write the combined export: project name to its builds, keys sorted.
pub fn write_export(
    path: &Path,
    entries: &BTreeMap<String, Vec<BuildRecord>>,
) -> Result<(), HarvestError> {
    write_json_atomic(path, entries)?;
    info!(path = %path.display(), projects = entries.len(), "Wrote export");
    Ok(())
}
