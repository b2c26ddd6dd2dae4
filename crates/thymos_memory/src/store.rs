//! JSON state store: one document per agent scope.
//!
//! Reads never fail: a missing, unreadable or corrupt document is treated as
//! an empty state. Writes go to a temp file in the same directory, which is
//! then renamed over the target, so readers only ever see whole documents.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thymos_core::EmotionState;

/// Load the document at `path`. Errors are absorbed and logged.
pub fn load_state(path: &Path) -> EmotionState {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No state at {}, starting empty", path.display());
            return EmotionState::default();
        }
        Err(e) => {
            tracing::warn!("Failed to read state {} ({}), starting empty", path.display(), e);
            return EmotionState::default();
        }
    };

    match serde_json::from_str::<EmotionState>(&raw) {
        Ok(mut state) => {
            state.repair();
            state
        }
        Err(e) => {
            tracing::warn!("Corrupt state {} ({}), starting empty", path.display(), e);
            EmotionState::default()
        }
    }
}

/// Persist `state` atomically, creating parent directories as needed.
pub fn save_state(path: &Path, state: &EmotionState) -> Result<()> {
    let payload = serde_json::to_vec_pretty(state).context("Failed to serialize state")?;
    write_atomic(path, &payload)
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory {}", parent.display()))?;

    // pid + counter keeps concurrent writers from sharing a temp file.
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());
    let temp_path = parent.join(format!(".{}.{}-{}.tmp", file_name, std::process::id(), seq));

    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file {}", temp_path.display()))?;
    let written = file.write_all(data).and_then(|_| file.sync_data());
    drop(file);
    discard_on_error(&temp_path, written, || {
        format!("Failed to write temp file {}", temp_path.display())
    })?;

    discard_on_error(&temp_path, fs::rename(&temp_path, path), || {
        format!("Failed to replace {}", path.display())
    })
}

/// Remove the temp file when `result` failed, so no partial write is left behind.
fn discard_on_error<T, F>(temp_path: &Path, result: std::io::Result<T>, context: F) -> Result<T>
where
    F: FnOnce() -> String,
{
    result.map_err(|e| {
        let _ = fs::remove_file(temp_path);
        anyhow::Error::new(e).context(context())
    })
}

/// Location of one scope's document and its lock marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<root>/<agent_id>/<file_name>`, with the agent id folded into a
    /// single safe path component.
    pub fn for_scope(root: &Path, file_name: &str, agent_id: &str) -> Self {
        Self::new(root.join(scope_dir_name(agent_id)).join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling marker `<document-path>.lock`.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    pub fn load(&self) -> EmotionState {
        load_state(&self.path)
    }

    pub fn save(&self, state: &EmotionState) -> Result<()> {
        save_state(&self.path, state)
    }
}

/// Map an agent id onto a directory name: ASCII alphanumerics, `-`, `_` and
/// `.` are kept, anything else becomes `_`.
pub fn scope_dir_name(agent_id: &str) -> String {
    let cleaned: String = agent_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "default".to_string()
    } else {
        cleaned
    }
}
