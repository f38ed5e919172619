//! `kb submit`: record a transaction or edit one by id.
//!
//! Every submission appends a versioned row; resubmitting with `--id`
//! replaces the live entry for that id.

use crate::author;
use crate::cmd::open_ledger;
use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::Args;
use kakeibo_core::{EntryId, Gist, Submission};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Transaction date (YYYY-MM-DD).
    pub date: NaiveDate,

    /// Category, e.g. `月額` for bills or `給料` for salary.
    #[arg(short, long, default_value = "")]
    pub category: String,

    /// Signed amount for participant A.
    #[arg(short = 'a', long, allow_negative_numbers = true)]
    pub amount_a: Option<i64>,

    /// Signed amount for participant B.
    #[arg(short = 'b', long, allow_negative_numbers = true)]
    pub amount_b: Option<i64>,

    /// Free-text remark. Names the series for bills and salaries.
    #[arg(short, long, default_value = "")]
    pub remark: String,

    /// Id of an existing transaction to replace.
    #[arg(long)]
    pub id: Option<String>,
}

impl SubmitArgs {
    fn submission(&self) -> Submission {
        Submission {
            date: self.date,
            category: self.category.clone(),
            amount_a: self.amount_a,
            amount_b: self.amount_b,
            remark: self.remark.clone(),
            id: self.id.as_deref().map(EntryId::new),
        }
    }
}

#[derive(Debug, Serialize)]
struct SubmitOutput {
    id: EntryId,
    entry: Gist,
}

/// Execute `kb submit`.
///
/// # Errors
///
/// Returns an error if no author resolves, the ledger is not initialized,
/// or the append fails.
pub fn run_submit(
    args: &SubmitArgs,
    author_flag: Option<&str>,
    user_author: Option<&str>,
    output: OutputMode,
    root: &Path,
) -> Result<()> {
    let author = author::require_author(author_flag, user_author)?;
    let ledger = open_ledger(root)?;
    let submission = args.submission();
    let id = ledger
        .submit(&submission, &author)
        .context("failed to submit transaction")?;

    let result = SubmitOutput {
        id,
        entry: submission.gist(),
    };
    render(output, &result, |r, w| writeln!(w, "{}\t{}", r.id, r.entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_carries_optional_fields() {
        let args = SubmitArgs {
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            category: "月額".to_string(),
            amount_a: Some(-5000),
            amount_b: None,
            remark: "電気".to_string(),
            id: Some("42".to_string()),
        };
        let submission = args.submission();
        assert_eq!(submission.id, Some(EntryId::new("42")));
        assert_eq!(
            submission.gist(),
            Gist::new("2024-01-05", "月額", "-5000", "", "電気")
        );
    }
}
