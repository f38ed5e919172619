//! Journal rows, gists and identifiers.
//!
//! A [`LogRow`] is what the journal stores: the five economic fields (the
//! [`Gist`]) optionally followed by API metadata ([`RowMeta`]). Rows without
//! metadata are *final* and always count; rows with metadata are *versions*
//! of the transaction named by their [`EntryId`], and the last version in
//! journal order wins. A version whose gist is entirely empty is a tombstone.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque identifier shared by every version of the same transaction.
///
/// Identifiers issued by [`IdGenerator`](crate::id::IdGenerator) are decimal
/// Unix-second counters, but rows imported from elsewhere may carry any
/// non-empty text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Wrap raw identifier text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Identifier text as stored in the journal.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, if this identifier is a plain decimal integer.
    #[must_use]
    pub fn as_number(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl From<i64> for EntryId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key under which a compiled entry is reported.
///
/// Final rows have no identifier of their own, so reports give them a
/// synthetic key derived from their 1-based position in the journal and
/// negated. Real identifiers are never negative numbers, so the two spaces
/// cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum EntryKey {
    Id(EntryId),
    Position(i64),
}

impl EntryKey {
    /// Synthetic key for the row at `index` (0-based) in journal order.
    #[must_use]
    pub fn for_position(index: usize) -> Self {
        let position = i64::try_from(index).map_or(i64::MAX, |i| i.saturating_add(1));
        Self::Position(-position)
    }

    /// Returns `true` for keys derived from a row position.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        matches!(self, Self::Position(_))
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Position(pos) => write!(f, "{pos}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Gist
// ---------------------------------------------------------------------------

/// The five economic fields of a row, in journal column order.
///
/// Fields hold their stored textual form. The derived ordering compares
/// field by field in declaration order (date, category, amount A, amount B,
/// remark) using plain string comparison, which is the book's sort order.
/// Amounts therefore sort lexicographically, not numerically.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Gist {
    pub date: String,
    pub category: String,
    pub amount_a: String,
    pub amount_b: String,
    pub remark: String,
}

impl Gist {
    /// Build a gist from its five stored fields.
    #[must_use]
    pub fn new(
        date: impl Into<String>,
        category: impl Into<String>,
        amount_a: impl Into<String>,
        amount_b: impl Into<String>,
        remark: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            category: category.into(),
            amount_a: amount_a.into(),
            amount_b: amount_b.into(),
            remark: remark.into(),
        }
    }

    /// Returns `true` when every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|field| field.is_empty())
    }

    /// The fields in column order.
    #[must_use]
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.date,
            &self.category,
            &self.amount_a,
            &self.amount_b,
            &self.remark,
        ]
    }

    /// Amount stored for one participant.
    #[must_use]
    pub fn amount(&self, participant: Participant) -> &str {
        match participant {
            Participant::A => &self.amount_a,
            Participant::B => &self.amount_b,
        }
    }
}

impl fmt::Display for Gist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields().join(" "))
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// One of the two ledger participants, identified by amount column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    A,
    B,
}

impl Participant {
    /// The other participant.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// API metadata carried by versioned rows (journal fields 6–8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMeta {
    pub id: EntryId,
    /// When the row was appended. Informational only.
    pub recorded_at: String,
    /// Who appended the row. Informational only.
    pub author: String,
}

/// How a row participates in compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// No identifier; always contributes when non-empty.
    Final,
    /// Latest state for its identifier.
    Version,
    /// Deletes its identifier.
    Tombstone,
}

/// One raw, immutable journal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    pub gist: Gist,
    pub meta: Option<RowMeta>,
}

impl LogRow {
    /// A final row without identifier.
    #[must_use]
    pub const fn final_row(gist: Gist) -> Self {
        Self { gist, meta: None }
    }

    /// A version of the transaction named in `meta`.
    #[must_use]
    pub const fn versioned(gist: Gist, meta: RowMeta) -> Self {
        Self {
            gist,
            meta: Some(meta),
        }
    }

    /// A tombstone deleting `id`.
    #[must_use]
    pub fn tombstone(id: EntryId, recorded_at: impl Into<String>, author: impl Into<String>) -> Self {
        Self::versioned(
            Gist::default(),
            RowMeta {
                id,
                recorded_at: recorded_at.into(),
                author: author.into(),
            },
        )
    }

    /// Identifier of a versioned row.
    #[must_use]
    pub fn id(&self) -> Option<&EntryId> {
        self.meta.as_ref().map(|meta| &meta.id)
    }

    #[must_use]
    pub fn kind(&self) -> RowKind {
        match (&self.meta, self.gist.is_empty()) {
            (None, _) => RowKind::Final,
            (Some(_), false) => RowKind::Version,
            (Some(_), true) => RowKind::Tombstone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gist_orders_field_by_field() {
        let earlier = Gist::new("2024-01-01", "日常", "-500", "", "Shop");
        let later_date = Gist::new("2024-01-02", "", "", "", "");
        let same_date_other_category = Gist::new("2024-01-01", "月額", "", "", "");
        assert!(earlier < later_date);
        assert!(earlier < same_date_other_category);
    }

    #[test]
    fn amounts_compare_as_text() {
        let nine = Gist::new("2024-01-01", "日常", "9", "", "");
        let ten = Gist::new("2024-01-01", "日常", "10", "", "");
        // "10" < "9" lexicographically
        assert!(ten < nine);
    }

    #[test]
    fn row_kind_follows_meta_and_emptiness() {
        let gist = Gist::new("2024-01-01", "日常", "-500", "", "Shop");
        assert_eq!(LogRow::final_row(gist.clone()).kind(), RowKind::Final);
        assert_eq!(LogRow::final_row(Gist::default()).kind(), RowKind::Final);

        let meta = RowMeta {
            id: EntryId::from(10),
            recorded_at: "2024-01-01T10:00:00".into(),
            author: "riku".into(),
        };
        assert_eq!(LogRow::versioned(gist, meta).kind(), RowKind::Version);
        assert_eq!(
            LogRow::tombstone(EntryId::from(10), "", "riku").kind(),
            RowKind::Tombstone
        );
    }

    #[test]
    fn synthetic_keys_are_negative_and_distinct() {
        assert_eq!(EntryKey::for_position(0), EntryKey::Position(-1));
        assert_eq!(EntryKey::for_position(41), EntryKey::Position(-42));
        assert!(EntryKey::for_position(3).is_synthetic());
        assert!(!EntryKey::Id(EntryId::from(3)).is_synthetic());
    }

    #[test]
    fn entry_id_numeric_view() {
        assert_eq!(EntryId::from(1_700_000_000).as_number(), Some(1_700_000_000));
        assert_eq!(EntryId::new("1700000000+1").as_number(), None);
    }
}
