//! Receipt drafts.
//!
//! A draft is the unvalidated output of receipt extraction: any of date,
//! amount, merchant registration number, category and remark may be
//! missing. A draft only becomes a [`Submission`] once the user says who
//! paid and how the money moved.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::intake::Submission;
use crate::model::Participant;

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("invalid draft JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("draft has no {missing}")]
    Incomplete { missing: &'static str },
}

impl DraftError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::InvalidField,
            Self::Incomplete { .. } => ErrorCode::IncompleteDraft,
        }
    }
}

/// Candidate transaction read off a receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptDraft {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Receipt total, always positive.
    #[serde(default)]
    pub amount: Option<i64>,
    /// Merchant registration number, e.g. `T1234567890123`.
    #[serde(default)]
    pub registration: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
}

/// Direction of money for the paying participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// The payer spent the amount.
    Expense,
    /// The payer received the amount.
    Income,
    /// The payer gave the amount to the other participant.
    Transfer,
}

impl Flow {
    /// Amounts for `(payer, other)`.
    #[must_use]
    pub const fn split(self, amount: i64) -> (i64, Option<i64>) {
        match self {
            Self::Expense => (-amount, None),
            Self::Income => (amount, None),
            Self::Transfer => (-amount, Some(amount)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(ReceiptDraft),
    Many(Vec<ReceiptDraft>),
}

/// Parse one draft object or an array of drafts.
///
/// # Errors
///
/// Returns [`DraftError::Parse`] if the input is neither.
pub fn parse_drafts(json: &str) -> Result<Vec<ReceiptDraft>, DraftError> {
    Ok(match serde_json::from_str::<OneOrMany>(json)? {
        OneOrMany::One(draft) => vec![draft],
        OneOrMany::Many(drafts) => drafts,
    })
}

impl ReceiptDraft {
    /// Fields still needed before the draft can be submitted.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push("date");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        missing
    }

    /// Turn the draft into a submission paid by `payer`.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::Incomplete`] if the date or amount is missing.
    pub fn into_submission(self, payer: Participant, flow: Flow) -> Result<Submission, DraftError> {
        let date = self.date.ok_or(DraftError::Incomplete { missing: "date" })?;
        let amount = self.amount.ok_or(DraftError::Incomplete { missing: "amount" })?;

        let (mine, theirs) = flow.split(amount);
        let (amount_a, amount_b) = match payer {
            Participant::A => (Some(mine), theirs),
            Participant::B => (theirs, Some(mine)),
        };
        Ok(Submission {
            date,
            category: self.category.unwrap_or_default(),
            amount_a,
            amount_b,
            remark: self.remark.unwrap_or_default(),
            id: None,
        })
    }
}
