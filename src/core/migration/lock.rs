//! Type-scoped exclusive locks
//!
//! A [`LockTable`] excludes runs within one process. With a lock directory
//! it also takes a `<type>.lock` file there, so processes sharing the same
//! snapshot directory exclude each other too.

use crate::domain::records::MigrationType;
use crate::domain::{MigrateError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Lock table keyed by migration type
///
/// Migrate, rollback and cleanup of the same type exclude each other;
/// different types proceed independently.
#[derive(Debug, Clone, Default)]
pub struct LockTable {
    held: Arc<Mutex<HashSet<MigrationType>>>,
    files: Option<Arc<LockFiles>>,
}

impl LockTable {
    /// In-process locks only
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks that also hold a lock file under `directory`
    ///
    /// A lock file older than `stale_after` belongs to a crashed process and
    /// is taken over.
    pub fn with_directory(directory: impl Into<PathBuf>, stale_after: Duration) -> Self {
        Self {
            held: Arc::default(),
            files: Some(Arc::new(LockFiles {
                directory: directory.into(),
                stale_after,
            })),
        }
    }

    /// Take the lock for `migration_type`
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::AlreadyRunning`] if the lock is held here or
    /// by another process, [`MigrateError::Io`] if the lock file cannot be
    /// written.
    pub fn acquire(&self, migration_type: MigrationType) -> Result<LockGuard> {
        {
            let mut held = self
                .held
                .lock()
                .map_err(|_| MigrateError::History("lock table poisoned".to_string()))?;
            if !held.insert(migration_type) {
                return Err(MigrateError::AlreadyRunning(migration_type));
            }
        }

        let file = match &self.files {
            Some(files) => match files.create(migration_type) {
                Ok(path) => Some(path),
                Err(e) => {
                    self.release(migration_type);
                    return Err(e);
                }
            },
            None => None,
        };

        tracing::debug!(migration_type = %migration_type, "Type lock acquired");
        Ok(LockGuard {
            held: Arc::clone(&self.held),
            migration_type,
            file,
        })
    }

    pub fn is_held(&self, migration_type: MigrationType) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(&migration_type))
            .unwrap_or(false)
    }

    fn release(&self, migration_type: MigrationType) {
        if let Ok(mut held) = self.held.lock() {
            held.remove(&migration_type);
        }
    }
}

/// Who holds a lock file
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockOwner {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

#[derive(Debug)]
struct LockFiles {
    directory: PathBuf,
    stale_after: Duration,
}

impl LockFiles {
    fn path_for(&self, migration_type: MigrationType) -> PathBuf {
        self.directory.join(format!("{migration_type}.lock"))
    }

    fn create(&self, migration_type: MigrationType) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.path_for(migration_type);

        match write_new(&path) {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() != ErrorKind::AlreadyExists => return Err(e.into()),
            Err(_) => {}
        }

        if !self.is_stale(&path) {
            tracing::warn!(
                migration_type = %migration_type,
                lock_file = %path.display(),
                "Type lock held by another process"
            );
            return Err(MigrateError::AlreadyRunning(migration_type));
        }

        tracing::warn!(
            migration_type = %migration_type,
            lock_file = %path.display(),
            "Taking over stale lock file"
        );
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        match write_new(&path) {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(MigrateError::AlreadyRunning(migration_type))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn is_stale(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > self.stale_after)
    }
}

/// Create `path` only if it does not exist yet and record the owner in it
fn write_new(path: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let owner = LockOwner {
        pid: std::process::id(),
        acquired_at: Utc::now(),
    };
    let body = serde_json::to_vec(&owner).map_err(std::io::Error::other)?;
    file.write_all(&body)?;
    file.sync_all()
}

/// Releases its type lock when dropped
#[derive(Debug)]
pub struct LockGuard {
    held: Arc<Mutex<HashSet<MigrationType>>>,
    migration_type: MigrationType,
    file: Option<PathBuf>,
}

impl LockGuard {
    pub fn migration_type(&self) -> MigrationType {
        self.migration_type
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(path) = &self.file {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!(
                    lock_file = %path.display(),
                    error = %e,
                    "Failed to remove lock file"
                );
            }
        }
        if let Ok(mut held) = self.held.lock() {
            held.remove(&self.migration_type);
        }
        tracing::debug!(migration_type = %self.migration_type, "Type lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_excludes_same_type() {
        let locks = LockTable::new();
        let guard = locks.acquire(MigrationType::Matches).unwrap();

        assert!(matches!(
            locks.acquire(MigrationType::Matches),
            Err(MigrateError::AlreadyRunning(MigrationType::Matches))
        ));
        let _other = locks.acquire(MigrationType::Standings).unwrap();

        drop(guard);
        assert!(!locks.is_held(MigrationType::Matches));
        locks.acquire(MigrationType::Matches).unwrap();
    }

    #[test]
    fn test_guard_released_on_early_return() {
        fn fails(locks: &LockTable) -> Result<()> {
            let _guard = locks.acquire(MigrationType::Standings)?;
            Err(MigrateError::Io("boom".to_string()))
        }

        let locks = LockTable::new();
        assert!(fails(&locks).is_err());
        assert!(!locks.is_held(MigrationType::Standings));
    }

    #[test]
    fn test_lock_file_excludes_other_tables() {
        let dir = TempDir::new().unwrap();
        let first = LockTable::with_directory(dir.path(), Duration::from_secs(3600));
        let second = LockTable::with_directory(dir.path(), Duration::from_secs(3600));

        let guard = first.acquire(MigrationType::Matches).unwrap();
        assert!(dir.path().join("matches.lock").exists());
        assert!(matches!(
            second.acquire(MigrationType::Matches),
            Err(MigrateError::AlreadyRunning(MigrationType::Matches))
        ));
        assert!(!second.is_held(MigrationType::Matches));
        second.acquire(MigrationType::Standings).unwrap();

        drop(guard);
        assert!(!dir.path().join("matches.lock").exists());
        second.acquire(MigrationType::Matches).unwrap();
    }

    #[test]
    fn test_stale_lock_file_is_taken_over() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("standings.lock"), b"{}").unwrap();

        let strict = LockTable::with_directory(dir.path(), Duration::from_secs(3600));
        assert!(strict.acquire(MigrationType::Standings).is_err());

        std::thread::sleep(Duration::from_millis(20));
        let lenient = LockTable::with_directory(dir.path(), Duration::from_millis(1));
        let _guard = lenient.acquire(MigrationType::Standings).unwrap();

        let body = std::fs::read(dir.path().join("standings.lock")).unwrap();
        let owner: LockOwner = serde_json::from_slice(&body).unwrap();
        assert_eq!(owner.pid, std::process::id());
    }
}
