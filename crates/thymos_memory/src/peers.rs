//! Read-only scan of sibling agent scopes.
//!
//! Peer data is advisory: any sibling that cannot be read or parsed is
//! skipped, and an unreadable root yields an empty list.

use serde::Serialize;
use std::fs;
use std::path::Path;
use thymos_core::EmotionEntry;

use crate::store::load_state;

/// Another agent's most recent entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peer {
    pub id: String,
    pub latest: EmotionEntry,
}

/// Collect up to `max_count` peers under `root`, skipping `exclude_id`.
///
/// Siblings are visited in directory-name order. Each sibling's own entry is
/// taken from its agent bucket, falling back to a same-named user bucket.
pub fn load_peers(root: &Path, file_name: &str, exclude_id: &str, max_count: usize) -> Vec<Peer> {
    if max_count == 0 {
        return Vec::new();
    }

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot scan peers under {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name != exclude_id)
        .collect();
    names.sort();

    let mut peers = Vec::new();
    for name in names {
        if peers.len() >= max_count {
            break;
        }
        let path = root.join(&name).join(file_name);
        if !path.is_file() {
            continue;
        }
        // load_state absorbs read/parse failures as an empty document.
        let state = load_state(&path);
        let latest = state
            .agents
            .get(&name)
            .and_then(|b| b.latest.clone())
            .or_else(|| state.users.get(&name).and_then(|b| b.latest.clone()));
        if let Some(latest) = latest {
            peers.push(Peer { id: name, latest });
        }
    }
    peers
}
