//! Grouping of book entries into recurring payment series.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::LedgerConfig;
use crate::model::{Gist, Participant};

/// Payer label for salary entries with no remark and no amount.
pub const UNKNOWN_PAYER: &str = "unknown";

/// Name of a recurring payment series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesName {
    /// Monthly salary, by payer.
    Salary(String),
    /// Monthly bill, by bill name.
    Bill(String),
}

impl fmt::Display for SeriesName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Salary(payer) => write!(f, "salary {payer}"),
            Self::Bill(name) => write!(f, "bill {name}"),
        }
    }
}

impl Serialize for SeriesName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How an entry takes part in recurrence tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Tracked under this series.
    Series(SeriesName),
    /// A bill entry without a name; reported and not tracked.
    UnknownBill,
    /// Not a recurring category.
    Untracked,
}

/// Assigns book entries to series.
///
/// The recurrence algorithm only sees [`Classification`]s, so the naming
/// convention can be swapped without touching it. Any
/// `Fn(&Gist) -> Classification` is a namer.
pub trait SeriesNamer {
    fn classify(&self, entry: &Gist) -> Classification;
}

impl<F> SeriesNamer for F
where
    F: Fn(&Gist) -> Classification,
{
    fn classify(&self, entry: &Gist) -> Classification {
        self(entry)
    }
}

/// The household convention: salaries named by remark or paying column,
/// bills named by remark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseholdNamer {
    pub salary_category: String,
    pub bill_category: String,
    pub salary_a: String,
    pub salary_b: String,
}

impl HouseholdNamer {
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self {
            salary_category: config.categories.salary.clone(),
            bill_category: config.categories.bill.clone(),
            salary_a: config.participants.salary_label_a().to_string(),
            salary_b: config.participants.salary_label_b().to_string(),
        }
    }

    fn payer(&self, entry: &Gist) -> String {
        if !entry.remark.is_empty() {
            return entry.remark.clone();
        }
        if is_nonzero(entry.amount(Participant::A)) {
            return self.salary_a.clone();
        }
        if is_nonzero(entry.amount(Participant::B)) {
            return self.salary_b.clone();
        }
        UNKNOWN_PAYER.to_string()
    }
}

impl Default for HouseholdNamer {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

impl SeriesNamer for HouseholdNamer {
    fn classify(&self, entry: &Gist) -> Classification {
        if entry.category == self.salary_category {
            Classification::Series(SeriesName::Salary(self.payer(entry)))
        } else if entry.category == self.bill_category {
            if entry.remark.is_empty() {
                Classification::UnknownBill
            } else {
                Classification::Series(SeriesName::Bill(entry.remark.clone()))
            }
        } else {
            Classification::Untracked
        }
    }
}

/// A stored amount counts as paid when it is present and not a literal zero.
fn is_nonzero(amount: &str) -> bool {
    let amount = amount.trim();
    !amount.is_empty() && !matches!(amount.parse::<i64>(), Ok(0))
}
