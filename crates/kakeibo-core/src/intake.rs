//! Submitting and withdrawing transactions.
//!
//! [`Ledger`] ties a ledger directory together: its config, its journal and
//! the id generator seeded from the journal. Every write goes through it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compact::{CompiledBook, KeyedEntry, compact, compact_keyed};
use crate::config::{ConfigError, LEDGER_CONFIG_FILE, LedgerConfig, load_ledger_config};
use crate::error::ErrorCode;
use crate::id::{Clock, IdGenerator, SystemClock};
use crate::journal::{Journal, JournalError, JournalOptions, JournalScan};
use crate::model::{EntryId, Gist, LogRow, RowMeta};

/// Format of the `recorded_at` metadata field.
pub const RECORDED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("no ledger at {root}")]
    NotInitialized { root: PathBuf },

    #[error("transaction id must not be blank: {id:?}")]
    BlankId { id: String },

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IntakeError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized { .. } => ErrorCode::NotInitialized,
            Self::BlankId { .. } => ErrorCode::InvalidField,
            Self::Journal(err) => err.code(),
            Self::Config(err) => err.code(),
            Self::Io { .. } => ErrorCode::StorageUnavailable,
        }
    }
}

/// A transaction as submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub date: NaiveDate,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount_a: Option<i64>,
    #[serde(default)]
    pub amount_b: Option<i64>,
    #[serde(default)]
    pub remark: String,
    /// Id of the transaction being edited. A fresh id is issued when absent.
    #[serde(default)]
    pub id: Option<EntryId>,
}

impl Submission {
    #[must_use]
    pub fn gist(&self) -> Gist {
        let amount = |value: Option<i64>| value.map(|v| v.to_string()).unwrap_or_default();
        Gist::new(
            self.date.format("%Y-%m-%d").to_string(),
            self.category.clone(),
            amount(self.amount_a),
            amount(self.amount_b),
            self.remark.clone(),
        )
    }
}

/// Outcome of [`Ledger::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub created_journal: bool,
    pub created_config: bool,
}

/// An opened ledger directory.
#[derive(Debug)]
pub struct Ledger<C = SystemClock> {
    root: PathBuf,
    config: LedgerConfig,
    journal: Journal,
    ids: IdGenerator<C>,
}

impl Ledger<SystemClock> {
    /// Create the journal and a default `kakeibo.toml` in `root` if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or either file cannot be created.
    pub fn init(root: &Path) -> Result<InitReport, IntakeError> {
        fs::create_dir_all(root).map_err(|source| IntakeError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let config_path = root.join(LEDGER_CONFIG_FILE);
        let created_config = !config_path.exists();
        if created_config {
            let io_err = |source| IntakeError::Io {
                path: config_path.clone(),
                source,
            };
            let rendered = toml::to_string_pretty(&LedgerConfig::default())
                .map_err(|e| io_err(std::io::Error::other(e)))?;
            fs::write(&config_path, rendered).map_err(io_err)?;
        }

        let config = load_ledger_config(root)?;
        let created_journal = journal_for(root, &config).init()?;
        info!(root = %root.display(), created_journal, created_config, "initialized ledger");
        Ok(InitReport {
            created_journal,
            created_config,
        })
    }

    /// Open the ledger in `root` using the system clock for ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the config or journal cannot be read.
    pub fn open(root: &Path) -> Result<Self, IntakeError> {
        Self::open_with_clock(root, SystemClock)
    }
}

impl<C: Clock> Ledger<C> {
    /// Open the ledger in `root`, issuing ids from `clock`.
    ///
    /// The id generator resumes after the largest numeric id in the journal.
    ///
    /// # Errors
    ///
    /// Returns an error if the config or journal cannot be read.
    pub fn open_with_clock(root: &Path, clock: C) -> Result<Self, IntakeError> {
        let config = load_ledger_config(root)?;
        let journal = journal_for(root, &config);
        let last_id = last_numeric_id(&journal)?;
        debug!(root = %root.display(), last_id, "opened ledger");
        Ok(Self {
            root: root.to_path_buf(),
            config,
            journal,
            ids: IdGenerator::with_clock(clock).resume_after(last_id),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Record a transaction, returning its id.
    ///
    /// A fresh id is issued while the journal lock is held, after re-reading
    /// the largest id on disk, so concurrent writers never share one.
    /// A caller-supplied id is trimmed before use.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotInitialized`] if the ledger has no journal,
    /// [`IntakeError::BlankId`] for an id with no text, or the journal error
    /// if the append fails. A failed submission is not recorded.
    pub fn submit(&self, submission: &Submission, author: &str) -> Result<EntryId, IntakeError> {
        self.ensure_initialized()?;
        let supplied = submission.id.as_ref().map(checked_id).transpose()?;
        let gist = submission.gist();
        let id = self.journal.append_with(|| {
            let id = supplied.map_or_else(|| self.fresh_id(), Ok)?;
            let row = LogRow::versioned(
                gist,
                RowMeta {
                    id: id.clone(),
                    recorded_at: recorded_now(),
                    author: author.to_string(),
                },
            );
            Ok((row, id))
        })?;
        Ok(id)
    }

    /// Delete a transaction by appending a tombstone for `id`, returning the
    /// id as recorded.
    ///
    /// Withdrawing an unknown id is accepted and has no effect on the book.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub fn withdraw(&self, id: &EntryId, author: &str) -> Result<EntryId, IntakeError> {
        self.ensure_initialized()?;
        let id = checked_id(id)?;
        let row = LogRow::tombstone(id.clone(), recorded_now(), author);
        self.journal.append(&row)?;
        Ok(id)
    }

    /// Read the whole journal.
    ///
    /// # Errors
    ///
    /// Returns the journal error if the file cannot be read.
    pub fn scan(&self) -> Result<JournalScan, IntakeError> {
        Ok(self.journal.read_all()?)
    }

    /// Compact the journal into the book.
    ///
    /// # Errors
    ///
    /// Returns the journal error if the file cannot be read.
    pub fn compile(&self) -> Result<CompiledBook, IntakeError> {
        Ok(compact(&self.scan()?.rows))
    }

    /// Compact the journal keeping each entry's key.
    ///
    /// # Errors
    ///
    /// Returns the journal error if the file cannot be read.
    pub fn compile_keyed(&self) -> Result<Vec<KeyedEntry>, IntakeError> {
        Ok(compact_keyed(&self.scan()?.rows))
    }

    /// Next id above everything issued here and everything on disk. Callers
    /// must hold the journal lock.
    fn fresh_id(&self) -> Result<EntryId, JournalError> {
        self.ids.observe(last_numeric_id(&self.journal)?);
        Ok(self.ids.next_id())
    }

    fn ensure_initialized(&self) -> Result<(), IntakeError> {
        if self.journal.path().exists() {
            Ok(())
        } else {
            Err(IntakeError::NotInitialized {
                root: self.root.clone(),
            })
        }
    }
}

fn journal_for(root: &Path, config: &LedgerConfig) -> Journal {
    Journal::with_options(
        root.join(&config.journal.file),
        JournalOptions {
            lock_path: root.join(".lock"),
            lock_timeout: config.journal.lock_timeout(),
            durable: config.journal.durable,
        },
    )
}

/// Trim `id`, rejecting it if nothing is left.
fn checked_id(id: &EntryId) -> Result<EntryId, IntakeError> {
    let trimmed = id.as_str().trim();
    if trimmed.is_empty() {
        return Err(IntakeError::BlankId {
            id: id.as_str().to_string(),
        });
    }
    Ok(EntryId::new(trimmed))
}

fn last_numeric_id(journal: &Journal) -> Result<i64, JournalError> {
    Ok(journal
        .read_all()?
        .rows
        .iter()
        .filter_map(|row| row.id().and_then(EntryId::as_number))
        .max()
        .unwrap_or(0))
}

fn recorded_now() -> String {
    Local::now().format(RECORDED_AT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RowKind;
    use std::sync::atomic::{AtomicI64, Ordering};
    use tempfile::TempDir;

    struct FixedClock(AtomicI64);

    impl Clock for FixedClock {
        fn now_secs(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn submission(date: (i32, u32, u32), amount_a: i64) -> Submission {
        Submission {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            category: "月額".into(),
            amount_a: Some(amount_a),
            amount_b: None,
            remark: "Shop".into(),
            id: None,
        }
    }

    fn ledger(dir: &TempDir, now: i64) -> Ledger<FixedClock> {
        Ledger::init(dir.path()).unwrap();
        Ledger::open_with_clock(dir.path(), FixedClock(AtomicI64::new(now))).unwrap()
    }

    #[test]
    fn init_creates_journal_and_config_once() {
        let dir = TempDir::new().unwrap();
        let first = Ledger::init(dir.path()).unwrap();
        assert!(first.created_journal && first.created_config);
        let second = Ledger::init(dir.path()).unwrap();
        assert!(!second.created_journal && !second.created_config);
        assert_eq!(load_ledger_config(dir.path()).unwrap(), LedgerConfig::default());
    }

    #[test]
    fn submit_requires_init() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(dir.path()).unwrap();
        let err = ledger.submit(&submission((2024, 1, 5), -5000), "riku").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotInitialized);
    }

    #[test]
    fn submit_issues_ids_and_appends_versions() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, 1_700_000_000);
        let first = ledger.submit(&submission((2024, 1, 5), -5000), "riku").unwrap();
        let second = ledger.submit(&submission((2024, 2, 5), -5000), "anju").unwrap();
        assert_eq!(first, EntryId::from(1_700_000_000));
        assert_eq!(second, EntryId::from(1_700_000_001));

        let rows = ledger.scan().unwrap().rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].kind(), RowKind::Version);
        let meta = rows[1].meta.as_ref().unwrap();
        assert_eq!(meta.author, "anju");
        assert_eq!(meta.recorded_at.len(), "2024-01-01T00:00:00".len());
        assert_eq!(rows[0].gist, Gist::new("2024-01-05", "月額", "-5000", "", "Shop"));
    }

    #[test]
    fn resubmitting_an_id_edits_the_entry() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, 1_700_000_000);
        let id = ledger.submit(&submission((2024, 1, 5), -5000), "riku").unwrap();
        let edit = Submission {
            id: Some(id),
            ..submission((2024, 1, 6), -5500)
        };
        ledger.submit(&edit, "riku").unwrap();

        let book = ledger.compile().unwrap();
        assert_eq!(book.entries(), &[Gist::new("2024-01-06", "月額", "-5500", "", "Shop")]);
    }

    #[test]
    fn withdraw_removes_the_entry() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, 1_700_000_000);
        let id = ledger.submit(&submission((2024, 1, 5), -5000), "riku").unwrap();
        ledger.withdraw(&id, "anju").unwrap();
        assert!(ledger.compile().unwrap().is_empty());
        assert_eq!(ledger.scan().unwrap().rows[1].kind(), RowKind::Tombstone);
    }

    #[test]
    fn withdrawing_unknown_id_is_accepted() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, 1_700_000_000);
        ledger.withdraw(&EntryId::from(42), "riku").unwrap();
        assert!(ledger.compile().unwrap().is_empty());
    }

    #[test]
    fn blank_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, 1_700_000_000);
        for raw in ["", "   "] {
            let edit = Submission {
                id: Some(EntryId::new(raw)),
                ..submission((2024, 1, 5), -5000)
            };
            let err = ledger.submit(&edit, "riku").unwrap_err();
            assert!(matches!(err, IntakeError::BlankId { .. }));
            assert_eq!(err.code(), ErrorCode::InvalidField);

            let err = ledger.withdraw(&EntryId::new(raw), "riku").unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidField);
        }
        assert!(ledger.scan().unwrap().rows.is_empty());
    }

    #[test]
    fn padded_ids_are_trimmed_on_submit_and_withdraw() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, 1_700_000_000);
        let edit = Submission {
            id: Some(EntryId::new(" 42")),
            ..submission((2024, 1, 5), -5000)
        };
        assert_eq!(ledger.submit(&edit, "riku").unwrap(), EntryId::from(42));
        assert_eq!(ledger.withdraw(&EntryId::new("42 "), "riku").unwrap(), EntryId::from(42));
        assert!(ledger.compile().unwrap().is_empty());
    }

    #[test]
    fn ledgers_opened_together_never_share_an_id() {
        let dir = TempDir::new().unwrap();
        let first = ledger(&dir, 1_700_000_000);
        let second =
            Ledger::open_with_clock(dir.path(), FixedClock(AtomicI64::new(1_700_000_000))).unwrap();

        let a = first.submit(&submission((2024, 1, 5), -5000), "riku").unwrap();
        let b = second.submit(&submission((2024, 2, 5), -5000), "anju").unwrap();
        assert_ne!(a, b);
        assert_eq!(b, EntryId::from(1_700_000_001));
        assert_eq!(first.compile().unwrap().len(), 2);
    }

    #[test]
    fn reopening_resumes_after_journal_ids() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, 1_700_000_500);
        ledger.submit(&submission((2024, 1, 5), -5000), "riku").unwrap();
        drop(ledger);

        let lagging = Ledger::open_with_clock(dir.path(), FixedClock(AtomicI64::new(1_700_000_000))).unwrap();
        let id = lagging.submit(&submission((2024, 2, 5), -5000), "riku").unwrap();
        assert_eq!(id, EntryId::from(1_700_000_501));
    }

    #[test]
    fn submission_gist_leaves_missing_amounts_empty() {
        let gist = submission((2024, 3, 1), -1).gist();
        assert_eq!(gist.amount_b, "");
        assert_eq!(gist.date, "2024-03-01");
    }
}
