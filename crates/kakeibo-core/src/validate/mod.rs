//! Diagnostic checks over a compiled book.
//!
//! Validation never fails and never touches the book or the journal: every
//! anomaly it detects is returned as a [`Finding`].
//!
//! Findings come out in a fixed order:
//!
//! 1. [`Finding::DuplicateEntry`] for each adjacent equal pair;
//! 2. [`Finding::InvalidDate`] and [`Finding::UnknownBill`] in book order;
//! 3. per series, in series-name order, the gap findings in date order
//!    followed by the series' count finding.

pub mod recurrence;
pub mod series;

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::compact::CompiledBook;
use crate::config::LedgerConfig;
use crate::model::Gist;

pub use recurrence::{RecurrencePolicy, month_span};
pub use series::{Classification, HouseholdNamer, SeriesName, SeriesNamer};

/// Date format of book entries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A non-fatal anomaly found in the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// Two identical entries.
    DuplicateEntry { entry: Gist },
    /// A bill entry with no bill name.
    UnknownBill { entry: Gist },
    /// A recurring entry whose date does not parse.
    InvalidDate { entry: Gist },
    /// No payment for more than the allowed gap.
    MissingPayment {
        series: SeriesName,
        from: NaiveDate,
        to: NaiveDate,
    },
    /// Two payments closer than the allowed gap.
    TooFrequent {
        series: SeriesName,
        from: NaiveDate,
        to: NaiveDate,
    },
    /// Payment count out of line with the months covered.
    PaymentCountMismatch {
        series: SeriesName,
        count: i64,
        month_span: i64,
        first: NaiveDate,
        last: NaiveDate,
    },
}

impl Finding {
    /// Short machine name of the finding kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateEntry { .. } => "duplicate_entry",
            Self::UnknownBill { .. } => "unknown_bill",
            Self::InvalidDate { .. } => "invalid_date",
            Self::MissingPayment { .. } => "missing_payment",
            Self::TooFrequent { .. } => "too_frequent",
            Self::PaymentCountMismatch { .. } => "payment_count_mismatch",
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEntry { entry } => write!(f, "duplicate: {entry}"),
            Self::UnknownBill { entry } => write!(f, "unknown bill: {entry}"),
            Self::InvalidDate { entry } => write!(f, "invalid date: {entry}"),
            Self::MissingPayment { series, from, to } => {
                write!(f, "{series}: no payment between {from} and {to}")
            }
            Self::TooFrequent { series, from, to } => {
                write!(f, "{series}: payments too close on {from} and {to}")
            }
            Self::PaymentCountMismatch {
                series,
                count,
                month_span,
                first,
                last,
            } => write!(
                f,
                "{series}: {count} payments instead of {month_span} between {first} and {last}"
            ),
        }
    }
}

/// Runs every check over a book.
#[derive(Debug, Clone)]
pub struct Validator<N = HouseholdNamer> {
    namer: N,
    policy: RecurrencePolicy,
}

impl Validator<HouseholdNamer> {
    /// Validator using the ledger's categories, payer labels and thresholds.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(
            HouseholdNamer::from_config(config),
            RecurrencePolicy::from(config.recurrence),
        )
    }
}

impl Default for Validator<HouseholdNamer> {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

impl<N: SeriesNamer> Validator<N> {
    #[must_use]
    pub const fn new(namer: N, policy: RecurrencePolicy) -> Self {
        Self { namer, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &RecurrencePolicy {
        &self.policy
    }

    /// Check a book for duplicates and cadence anomalies.
    #[must_use]
    pub fn validate(&self, book: &CompiledBook) -> Vec<Finding> {
        let mut findings = recurrence::find_duplicates(book.entries());
        let duplicates = findings.len();

        let mut ledger = recurrence::SeriesLedger::default();
        for entry in book {
            let name = match self.namer.classify(entry) {
                Classification::Series(name) => name,
                Classification::UnknownBill => {
                    findings.push(Finding::UnknownBill {
                        entry: entry.clone(),
                    });
                    continue;
                }
                Classification::Untracked => continue,
            };
            match NaiveDate::parse_from_str(&entry.date, DATE_FORMAT) {
                Ok(date) => ledger.record(name, date),
                Err(_) => findings.push(Finding::InvalidDate {
                    entry: entry.clone(),
                }),
            }
        }
        findings.extend(ledger.check(&self.policy));

        debug!(
            entries = book.len(),
            duplicates,
            findings = findings.len(),
            "validated book"
        );
        findings
    }
}
