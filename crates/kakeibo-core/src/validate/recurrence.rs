//! Duplicate and monthly cadence checks.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use super::Finding;
use super::series::SeriesName;
use crate::config::RecurrenceConfig;
use crate::model::Gist;

/// Thresholds for the cadence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrencePolicy {
    /// Gaps strictly longer than this many days are a missing payment.
    pub max_gap_days: i64,
    /// Gaps strictly shorter than this many days are too frequent.
    pub min_gap_days: i64,
    /// Allowed difference between payment count and months spanned.
    pub count_tolerance: i64,
}

impl Default for RecurrencePolicy {
    fn default() -> Self {
        Self::from(RecurrenceConfig::default())
    }
}

impl From<RecurrenceConfig> for RecurrencePolicy {
    fn from(config: RecurrenceConfig) -> Self {
        Self {
            max_gap_days: config.max_gap_days,
            min_gap_days: config.min_gap_days,
            count_tolerance: config.count_tolerance,
        }
    }
}

/// One finding per adjacent pair of equal entries in a sorted book.
pub(super) fn find_duplicates(entries: &[Gist]) -> Vec<Finding> {
    entries
        .windows(2)
        .filter(|pair| pair[0] == pair[1])
        .map(|pair| Finding::DuplicateEntry {
            entry: pair[1].clone(),
        })
        .collect()
}

/// Number of calendar months touched between two dates, inclusive.
///
/// 1 January to 1 March spans three months.
#[must_use]
pub fn month_span(first: NaiveDate, last: NaiveDate) -> i64 {
    let years = i64::from(last.year() - first.year());
    let months = i64::from(last.month()) - i64::from(first.month());
    years * 12 + months + 1
}

/// Dated payments grouped per series.
#[derive(Debug, Default)]
pub(super) struct SeriesLedger {
    series: BTreeMap<SeriesName, Vec<NaiveDate>>,
}

impl SeriesLedger {
    pub(super) fn record(&mut self, name: SeriesName, date: NaiveDate) {
        self.series.entry(name).or_default().push(date);
    }

    /// Run the gap and count checks over every series.
    pub(super) fn check(mut self, policy: &RecurrencePolicy) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (name, dates) in &mut self.series {
            dates.sort();
            check_series(name, dates, policy, &mut findings);
        }
        findings
    }
}

fn check_series(
    name: &SeriesName,
    dates: &[NaiveDate],
    policy: &RecurrencePolicy,
    findings: &mut Vec<Finding>,
) {
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return;
    };

    for pair in dates.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let gap = (to - from).num_days();
        if gap > policy.max_gap_days {
            findings.push(Finding::MissingPayment {
                series: name.clone(),
                from,
                to,
            });
        } else if gap < policy.min_gap_days {
            findings.push(Finding::TooFrequent {
                series: name.clone(),
                from,
                to,
            });
        }
    }

    let count = i64::try_from(dates.len()).unwrap_or(i64::MAX);
    let span = month_span(first, last);
    if count < span - policy.count_tolerance || count > span + policy.count_tolerance {
        findings.push(Finding::PaymentCountMismatch {
            series: name.clone(),
            count,
            month_span: span,
            first,
            last,
        });
    }
}
