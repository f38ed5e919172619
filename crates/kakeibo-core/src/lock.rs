//! Cross-process write lock for a ledger directory.
//!
//! Appends take an exclusive `flock` on `<ledger>/.lock` so that two `kb`
//! processes never interleave partial journal lines. Readers never lock: a
//! reader can only observe a trailing partial line, which the journal scan
//! ignores.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("ledger lock {path} still held after {waited:?}")]
    Timeout { path: PathBuf, waited: Duration },

    #[error("cannot open ledger lock {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Open { .. } => ErrorCode::StorageUnavailable,
        }
    }
}

/// Exclusive lock on a ledger's lock file, released on drop.
#[derive(Debug)]
pub struct JournalLock {
    file: File,
    path: PathBuf,
}

impl JournalLock {
    /// Take the lock at `path`, retrying every few milliseconds until
    /// `timeout` has passed. The lock file and its directory are created on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if another writer keeps the lock past
    /// `timeout`, or [`LockError::Open`] if the lock file cannot be created.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let open_err = |source| LockError::Open {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(open_err)?;

        let start = Instant::now();
        while file.try_lock_exclusive().is_err() {
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for JournalLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    #[test]
    fn second_holder_times_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lock");
        let held = JournalLock::acquire(&path, Duration::from_millis(50)).unwrap();
        assert_eq!(held.path(), path);

        let err = JournalLock::acquire(&path, Duration::from_millis(20)).unwrap_err();
        assert!(matches!(&err, LockError::Timeout { path: p, .. } if *p == path));
        assert_eq!(err.code(), ErrorCode::LockContention);
    }

    #[test]
    fn dropping_the_guard_frees_the_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lock");
        drop(JournalLock::acquire(&path, Duration::from_millis(50)).unwrap());
        assert!(JournalLock::acquire(&path, Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn creates_missing_ledger_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("household").join(".lock");
        let _lock = JournalLock::acquire(&path, Duration::from_millis(50)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn waiter_gets_lock_once_holder_finishes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lock");
        let (locked_tx, locked_rx) = mpsc::channel();

        let holder_path = path.clone();
        let holder = thread::spawn(move || {
            let _guard = JournalLock::acquire(&holder_path, Duration::from_millis(200)).unwrap();
            locked_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(50));
        });

        locked_rx.recv().unwrap();
        let waiter = JournalLock::acquire(&path, Duration::from_secs(5));
        holder.join().unwrap();
        assert!(waiter.is_ok());
    }
}
