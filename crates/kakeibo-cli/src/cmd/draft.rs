//! `kb draft`: turn receipt-reader JSON into submissions.
//!
//! A draft is only a suggestion. By default the command previews what would
//! be submitted; nothing is appended unless `--submit` is given together with
//! the payer.

use crate::author;
use crate::cmd::open_ledger;
use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use kakeibo_core::draft::{Flow, ReceiptDraft, parse_drafts};
use kakeibo_core::{EntryId, Participant, Submission};
use serde::Serialize;
use std::io::{Read as _, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PayerArg {
    A,
    B,
}

impl From<PayerArg> for Participant {
    fn from(value: PayerArg) -> Self {
        match value {
            PayerArg::A => Self::A,
            PayerArg::B => Self::B,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FlowArg {
    Expense,
    Income,
    Transfer,
}

impl From<FlowArg> for Flow {
    fn from(value: FlowArg) -> Self {
        match value {
            FlowArg::Expense => Self::Expense,
            FlowArg::Income => Self::Income,
            FlowArg::Transfer => Self::Transfer,
        }
    }
}

#[derive(Args, Debug)]
pub struct DraftArgs {
    /// JSON file with one draft object or an array of drafts. Reads stdin
    /// when omitted or `-`.
    pub file: Option<PathBuf>,

    /// Participant who paid.
    #[arg(long, value_enum)]
    pub payer: Option<PayerArg>,

    /// Direction of money for the payer.
    #[arg(long, value_enum, default_value = "expense")]
    pub flow: FlowArg,

    /// Append the drafts to the journal instead of previewing them.
    #[arg(long, requires = "payer")]
    pub submit: bool,
}

#[derive(Debug, Serialize)]
struct DraftPreview {
    draft: ReceiptDraft,
    missing: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submission: Option<Submission>,
}

#[derive(Debug, Serialize)]
struct Submitted {
    id: EntryId,
    submission: Submission,
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn preview(drafts: Vec<ReceiptDraft>, payer: Option<Participant>, flow: Flow) -> Vec<DraftPreview> {
    drafts
        .into_iter()
        .map(|draft| {
            let missing = draft.missing();
            let submission = payer
                .filter(|_| missing.is_empty())
                .and_then(|payer| draft.clone().into_submission(payer, flow).ok());
            DraftPreview {
                draft,
                missing,
                submission,
            }
        })
        .collect()
}

/// Execute `kb draft`.
///
/// With `--submit`, every draft is converted before anything is appended, so
/// one incomplete draft leaves the journal untouched.
///
/// # Errors
///
/// Returns an error if the input is not draft JSON, a draft is incomplete
/// when submitting, or the append fails.
pub fn run_draft(
    args: &DraftArgs,
    author_flag: Option<&str>,
    user_author: Option<&str>,
    output: OutputMode,
    root: &Path,
) -> Result<()> {
    let input = read_input(args.file.as_deref())?;
    let drafts = parse_drafts(&input).context("failed to parse receipt drafts")?;
    let payer = args.payer.map(Participant::from);
    let flow = Flow::from(args.flow);

    let Some(payer) = payer.filter(|_| args.submit) else {
        let previews = preview(drafts, payer, flow);
        return render(output, &previews, |previews, w| {
            for p in previews {
                match &p.submission {
                    Some(s) => writeln!(w, "ready\t{}", s.gist())?,
                    None if p.missing.is_empty() => writeln!(w, "ready\t(choose --payer)")?,
                    None => writeln!(w, "incomplete\tmissing {}", p.missing.join(", "))?,
                }
            }
            Ok(())
        });
    };

    let author = author::require_author(author_flag, user_author)?;
    let submissions = drafts
        .into_iter()
        .map(|draft| draft.into_submission(payer, flow))
        .collect::<Result<Vec<_>, _>>()
        .context("draft cannot be submitted")?;

    let ledger = open_ledger(root)?;
    let mut submitted = Vec::with_capacity(submissions.len());
    for submission in submissions {
        let id = ledger
            .submit(&submission, &author)
            .context("failed to submit draft")?;
        submitted.push(Submitted { id, submission });
    }

    render(output, &submitted, |submitted, w| {
        for s in submitted {
            writeln!(w, "{}\t{}", s.id, s.submission.gist())?;
        }
        Ok(())
    })
}
