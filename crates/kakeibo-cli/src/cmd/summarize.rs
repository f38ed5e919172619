//! `kb summarize`: per-participant totals and who settles with whom.

use crate::cmd::open_ledger;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::{Context as _, Result};
use kakeibo_core::Participant;
use kakeibo_core::config::ParticipantsConfig;
use kakeibo_core::summary::Summary;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct Total {
    participant: Participant,
    name: String,
    total: i64,
}

#[derive(Debug, Serialize)]
struct SettlementView {
    debtor: String,
    creditor: String,
    amount: i64,
}

#[derive(Debug, Serialize)]
struct SummarizeOutput {
    entries: usize,
    totals: Vec<Total>,
    settlement: Option<SettlementView>,
}

fn display_name(names: &ParticipantsConfig, participant: Participant) -> String {
    match participant {
        Participant::A => names.a.clone(),
        Participant::B => names.b.clone(),
    }
}

/// Execute `kb summarize`.
///
/// # Errors
///
/// Returns an error if the journal cannot be read or an amount in the book
/// is not an integer.
pub fn run_summarize(output: OutputMode, root: &Path) -> Result<()> {
    let ledger = open_ledger(root)?;
    let book = ledger.compile().context("failed to compile book")?;
    let summary = Summary::from_book(&book).context("failed to total amounts")?;
    let names = &ledger.config().participants;

    let result = SummarizeOutput {
        entries: book.len(),
        totals: [Participant::A, Participant::B]
            .into_iter()
            .map(|participant| Total {
                participant,
                name: display_name(names, participant),
                total: summary.total(participant),
            })
            .collect(),
        settlement: summary.settlement().map(|s| SettlementView {
            debtor: display_name(names, s.debtor),
            creditor: display_name(names, s.creditor),
            amount: s.amount,
        }),
    };

    render_mode(
        output,
        &result,
        |r, w| {
            for total in &r.totals {
                writeln!(w, "{}\t{}", total.name, total.total)?;
            }
            if let Some(s) = &r.settlement {
                writeln!(w, "settle\t{}\t{}\t{}", s.debtor, s.creditor, s.amount)?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, "Totals")?;
            for total in &r.totals {
                pretty_kv(w, &total.name, total.total.to_string())?;
            }
            writeln!(w)?;
            match &r.settlement {
                Some(s) => writeln!(w, "{} pays {} {}", s.debtor, s.creditor, s.amount),
                None => writeln!(w, "Even, nothing to settle"),
            }
        },
    )
}
