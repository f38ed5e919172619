//! Append-only journal store.
//!
//! The journal is a single tab-separated file (`log.tsv` by default), one
//! [`LogRow`] per line. It is the only source of truth: rows are appended,
//! never rewritten, reordered or removed.
//!
//! # Invariants
//!
//! - Appends are serialized by an in-process mutex and an advisory file lock,
//!   so no two appends interleave.
//! - Each append is a single `write_all` of a complete line followed by
//!   `flush` and, when durable, `sync_data` before returning.
//! - A last line without its terminating newline is still a row: readers
//!   decode it like any other line, and the next writer terminates it before
//!   appending. Nothing already in the file is ever truncated.
//! - Reading yields rows in exact append order. Lines that fail to decode are
//!   reported as [`MalformedRow`]s and skipped; they never abort a read.

pub mod codec;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read as _, Seek, SeekFrom, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::lock::{JournalLock, LockError};
use crate::model::LogRow;

pub use codec::{CodecError, decode_row, encode_line, encode_row};

/// Default time to wait for the journal lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// The journal file cannot be read or written.
    #[error("journal {path} is unavailable: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Lock acquisition failed.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// The row cannot be represented on one journal line.
    #[error("row rejected: {0}")]
    Codec(#[from] CodecError),
}

impl JournalError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::StorageUnavailable { .. } => ErrorCode::StorageUnavailable,
            Self::Lock(err) => err.code(),
            Self::Codec(_) => ErrorCode::InvalidField,
        }
    }

    fn storage(path: &Path, source: io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Read results
// ---------------------------------------------------------------------------

/// A journal line that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRow {
    /// 1-based line number in the journal file.
    pub line: usize,
    pub reason: String,
}

impl MalformedRow {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::MalformedRow
    }
}

/// Everything a full read of the journal produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalScan {
    /// Decoded rows in append order.
    pub rows: Vec<LogRow>,
    /// Lines that were skipped.
    pub malformed: Vec<MalformedRow>,
    /// 1-based number of the last line when the file does not end in a
    /// newline. That line is decoded like the others.
    pub unterminated_line: Option<usize>,
}

impl JournalScan {
    /// Decode a full journal image.
    #[must_use]
    pub fn from_bytes(content: &[u8]) -> Self {
        let mut scan = Self::default();
        if content.is_empty() {
            return scan;
        }

        let mut last = 0;
        for (index, raw) in content.split_inclusive(|&b| b == b'\n').enumerate() {
            let line = index + 1;
            last = line;
            let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
            let text = match std::str::from_utf8(raw) {
                Ok(text) => text,
                Err(err) => {
                    warn!(line, %err, "skipping non UTF-8 journal line");
                    scan.malformed.push(MalformedRow {
                        line,
                        reason: format!("invalid UTF-8: {err}"),
                    });
                    continue;
                }
            };
            match decode_row(text) {
                Ok(row) => scan.rows.push(row),
                Err(err) => {
                    warn!(line, %err, "skipping malformed journal line");
                    scan.malformed.push(MalformedRow {
                        line,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if content.last() != Some(&b'\n') {
            debug!(line = last, "journal does not end with a newline");
            scan.unterminated_line = Some(last);
        }
        scan
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Options controlling how the journal writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalOptions {
    /// Advisory lock file guarding appends.
    pub lock_path: PathBuf,
    /// How long an append waits for the lock.
    pub lock_timeout: Duration,
    /// Call `sync_data` after every append.
    pub durable: bool,
}

/// Append-only journal file.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    options: JournalOptions,
    writer: Mutex<()>,
}

impl Journal {
    /// Journal at `path`, locking a `.lock` file next to it.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path
            .parent()
            .map_or_else(|| PathBuf::from(".lock"), |dir| dir.join(".lock"));
        Self::with_options(
            path,
            JournalOptions {
                lock_path,
                lock_timeout: DEFAULT_LOCK_TIMEOUT,
                durable: true,
            },
        )
    }

    #[must_use]
    pub fn with_options(path: impl Into<PathBuf>, options: JournalOptions) -> Self {
        Self {
            path: path.into(),
            options,
            writer: Mutex::new(()),
        }
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn options(&self) -> &JournalOptions {
        &self.options
    }

    /// Create the journal file if it does not exist yet. Idempotent.
    ///
    /// Returns `true` if the file was created.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::StorageUnavailable`] if the file or its
    /// directory cannot be created.
    pub fn init(&self) -> Result<bool, JournalError> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| JournalError::storage(&self.path, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| JournalError::storage(&self.path, e))?;
        Ok(true)
    }

    /// Append one row.
    ///
    /// This method:
    /// 1. Encodes the row (rejecting values that would break the line format).
    /// 2. Takes the in-process writer mutex and the advisory file lock.
    /// 3. Prefixes a newline when the file's last line is unterminated, so
    ///    the existing row stays intact.
    /// 4. Writes the line with `O_APPEND` + `write_all` + `flush`.
    /// 5. Calls `sync_data` when the journal is durable.
    ///
    /// A failed append records nothing the caller should rely on.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::Codec`] for unencodable rows,
    /// [`JournalError::Lock`] if the lock cannot be acquired, or
    /// [`JournalError::StorageUnavailable`] on I/O failure.
    pub fn append(&self, row: &LogRow) -> Result<(), JournalError> {
        self.append_with(|| Ok((row.clone(), ())))
    }

    /// Append the row built by `build`, which runs while both the writer
    /// mutex and the file lock are held, and return the value it returned
    /// alongside the row.
    ///
    /// Lets callers derive the row from the journal's current contents
    /// without another writer slipping in between.
    ///
    /// # Errors
    ///
    /// Same as [`append`](Self::append), plus any error `build` returns.
    pub fn append_with<T, F>(&self, build: F) -> Result<T, JournalError>
    where
        F: FnOnce() -> Result<(LogRow, T), JournalError>,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = JournalLock::acquire(&self.options.lock_path, self.options.lock_timeout)?;

        let (row, value) = build()?;
        let mut line = encode_line(&row)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| JournalError::storage(&self.path, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| JournalError::storage(&self.path, e))?;
        if ends_mid_line(&mut file).map_err(|e| JournalError::storage(&self.path, e))? {
            warn!(path = %self.path.display(), "terminating unterminated last journal line");
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| JournalError::storage(&self.path, e))?;
        if self.options.durable {
            file.sync_data()
                .map_err(|e| JournalError::storage(&self.path, e))?;
        }

        match row.id() {
            Some(id) if row.gist.is_empty() => info!(%id, "appended tombstone"),
            Some(id) => info!(%id, date = %row.gist.date, "appended entry"),
            None => info!(date = %row.gist.date, "appended final row"),
        }
        Ok(value)
    }

    /// Read every row in append order.
    ///
    /// A missing journal file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::StorageUnavailable`] if the file exists but
    /// cannot be read.
    pub fn read_all(&self) -> Result<JournalScan, JournalError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "journal missing; reading as empty");
                return Ok(JournalScan::default());
            }
            Err(err) => return Err(JournalError::storage(&self.path, err)),
        };
        let scan = JournalScan::from_bytes(&content);
        debug!(
            rows = scan.rows.len(),
            malformed = scan.malformed.len(),
            "read journal"
        );
        Ok(scan)
    }
}

fn ends_mid_line(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0_u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
