//! Journal compaction into the book.
//!
//! Compaction is a single linear pass over the journal in append order:
//!
//! - final rows with a non-empty gist are kept, every one of them, in order;
//! - empty final rows are ignored;
//! - a versioned row overwrites the current gist for its id;
//! - a tombstone removes its id (removing an absent id is a no-op).
//!
//! The surviving gists are then stable-sorted by the field-wise gist order.
//! The result depends only on the rows and their order, so compacting the
//! same journal twice yields the same book.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::model::{EntryId, EntryKey, Gist, LogRow, RowKind};

/// The compacted, sorted view of every live entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompiledBook {
    entries: Vec<Gist>,
}

impl CompiledBook {
    /// Build a book from arbitrary entries, sorting them stably.
    #[must_use]
    pub fn from_entries(mut entries: Vec<Gist>) -> Self {
        entries.sort();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[Gist] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gist> {
        self.entries.iter()
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<Gist> {
        self.entries
    }

    /// The book re-expressed as final journal rows, one per entry.
    ///
    /// Compacting these rows reproduces this book.
    #[must_use]
    pub fn to_rows(&self) -> Vec<LogRow> {
        self.entries.iter().cloned().map(LogRow::final_row).collect()
    }
}

impl<'a> IntoIterator for &'a CompiledBook {
    type Item = &'a Gist;
    type IntoIter = std::slice::Iter<'a, Gist>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A live entry together with the key it is reported under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyedEntry {
    pub key: EntryKey,
    #[serde(flatten)]
    pub gist: Gist,
}

/// Compact rows into keyed entries, sorted by gist.
///
/// Final rows are keyed by [`EntryKey::for_position`] of their journal
/// index, versioned rows by their real id.
#[must_use]
pub fn compact_keyed(rows: &[LogRow]) -> Vec<KeyedEntry> {
    let mut finals: Vec<KeyedEntry> = Vec::new();
    let mut versioned: BTreeMap<&EntryId, &Gist> = BTreeMap::new();
    let mut ignored = 0_usize;

    for (index, row) in rows.iter().enumerate() {
        match (row.kind(), row.id()) {
            (RowKind::Final, _) if row.gist.is_empty() => ignored += 1,
            (RowKind::Final, _) => finals.push(KeyedEntry {
                key: EntryKey::for_position(index),
                gist: row.gist.clone(),
            }),
            (RowKind::Version, Some(id)) => {
                if versioned.insert(id, &row.gist).is_some() {
                    trace!(%id, "superseded earlier version");
                }
            }
            (RowKind::Tombstone, Some(id)) => {
                if versioned.remove(id).is_none() {
                    trace!(%id, "tombstone for unknown id");
                }
            }
            (RowKind::Version | RowKind::Tombstone, None) => ignored += 1,
        }
    }

    let live_versions = versioned.len();
    let mut entries = finals;
    entries.extend(versioned.into_iter().map(|(id, gist)| KeyedEntry {
        key: EntryKey::Id(id.clone()),
        gist: gist.clone(),
    }));
    entries.sort_by(|a, b| a.gist.cmp(&b.gist));

    debug!(
        rows = rows.len(),
        entries = entries.len(),
        live_versions,
        ignored,
        "compacted journal"
    );
    entries
}

/// Compact rows into the book.
#[must_use]
pub fn compact(rows: &[LogRow]) -> CompiledBook {
    CompiledBook {
        entries: compact_keyed(rows).into_iter().map(|e| e.gist).collect(),
    }
}
