//! Advisory lock: an exclusive-create marker file next to the state document.
//!
//! The marker's mtime is the only staleness signal. A marker older than
//! `stale_after` is treated as abandoned by a crashed holder, removed, and
//! acquisition is retried once. Release happens in `Drop`, so every exit
//! path out of the critical section (error, panic, cancelled future) frees it.
//!
//! Each marker holds its owner's token. A holder whose marker was reclaimed
//! leaves the new owner's marker alone on release.

use std::fs::{self, OpenOptions};
use std::future::Future;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder owns a fresh marker.
    #[error("lock {path} is held by another writer")]
    Busy { path: PathBuf },
    #[error("lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    pub fn is_busy(&self) -> bool {
        matches!(self, LockError::Busy { .. })
    }
}

/// A held advisory lock. Dropping it deletes the marker.
#[derive(Debug)]
pub struct AdvisoryLock {
    path: PathBuf,
    token: String,
}

impl AdvisoryLock {
    pub fn acquire(path: &Path, stale_after: Duration) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| LockError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }

        match try_create(path) {
            Ok(lock) => return Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(source) => {
                return Err(LockError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        if !is_stale(path, stale_after) {
            tracing::debug!("Lock {} is busy", path.display());
            return Err(LockError::Busy {
                path: path.to_path_buf(),
            });
        }

        tracing::warn!(
            "Reclaiming stale lock {} (older than {:?})",
            path.display(),
            stale_after
        );
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != ErrorKind::NotFound {
                return Err(LockError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }

        // One retry only; losing this race to another reclaimer is contention.
        match try_create(path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(LockError::Busy {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(LockError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AdvisoryLock {
    fn drop(&mut self) {
        match fs::read_to_string(&self.path) {
            Ok(owner) if owner == self.token => {}
            Ok(_) => {
                tracing::warn!(
                    "Lock {} was reclaimed by another writer, leaving it in place",
                    self.path.display()
                );
                return;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!("Failed to read lock {}: {}", self.path.display(), e);
                return;
            }
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("Failed to release lock {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Unique per acquisition: pid, in-process sequence and wall-clock nanos.
fn owner_token() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!(
        "{}:{}:{}",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed),
        nanos
    )
}

fn try_create(path: &Path) -> io::Result<AdvisoryLock> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let token = owner_token();
    if let Err(e) = file.write_all(token.as_bytes()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    tracing::debug!("Acquired lock {}", path.display());
    Ok(AdvisoryLock {
        path: path.to_path_buf(),
        token,
    })
}

/// Marker age strictly greater than `stale_after`. A marker we cannot stat
/// (e.g. removed in the meantime) counts as stale so the retry can proceed.
fn is_stale(path: &Path, stale_after: Duration) -> bool {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return true,
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) => age > stale_after,
        // Marker from the future (clock skew): treat as fresh.
        Err(_) => false,
    }
}

/// Run `body` while holding the lock at `lock_path`.
///
/// Returns `Err(LockError::Busy)` without running `body` when the lock is
/// held by someone else; callers must then proceed without mutating state.
pub async fn with_lock<F, Fut, T>(
    lock_path: &Path,
    stale_after: Duration,
    body: F,
) -> Result<T, LockError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let _guard = AdvisoryLock::acquire(lock_path, stale_after)?;
    Ok(body().await)
}
