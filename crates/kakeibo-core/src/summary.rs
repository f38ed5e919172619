//! Per-participant totals and settlement.

use serde::Serialize;
use tracing::debug;

use crate::compact::CompiledBook;
use crate::error::ErrorCode;
use crate::model::{Gist, Participant};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("entry {entry}: amount {value:?} for participant {participant:?} is not an integer")]
pub struct AmountError {
    pub entry: Gist,
    pub participant: Participant,
    pub value: String,
}

impl AmountError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidAmount
    }
}

/// Sum of each participant's amounts over a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_a: i64,
    pub total_b: i64,
}

/// Who owes whom to even out the totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub debtor: Participant,
    pub creditor: Participant,
    pub amount: i64,
}

impl Summary {
    /// Total every entry of `book`. Empty amounts count as zero.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] for the first amount that is not an integer.
    pub fn from_book(book: &CompiledBook) -> Result<Self, AmountError> {
        let mut summary = Self::default();
        for entry in book {
            summary.total_a = summary
                .total_a
                .saturating_add(parse_amount(entry, Participant::A)?);
            summary.total_b = summary
                .total_b
                .saturating_add(parse_amount(entry, Participant::B)?);
        }
        debug!(total_a = summary.total_a, total_b = summary.total_b, "summarized book");
        Ok(summary)
    }

    #[must_use]
    pub const fn total(&self, participant: Participant) -> i64 {
        match participant {
            Participant::A => self.total_a,
            Participant::B => self.total_b,
        }
    }

    /// The participant with the larger total owes half the difference to the
    /// other. `None` when the totals are equal.
    #[must_use]
    pub fn settlement(&self) -> Option<Settlement> {
        let debtor = match self.total_a.cmp(&self.total_b) {
            std::cmp::Ordering::Greater => Participant::A,
            std::cmp::Ordering::Less => Participant::B,
            std::cmp::Ordering::Equal => return None,
        };
        let creditor = debtor.other();
        let difference = self.total(debtor).saturating_sub(self.total(creditor));
        Some(Settlement {
            debtor,
            creditor,
            amount: difference / 2,
        })
    }
}

fn parse_amount(entry: &Gist, participant: Participant) -> Result<i64, AmountError> {
    let raw = entry.amount(participant).trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| AmountError {
        entry: entry.clone(),
        participant,
        value: raw.to_string(),
    })
}
