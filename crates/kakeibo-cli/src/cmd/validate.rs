//! `kb validate`: report duplicates and recurring-payment anomalies.
//!
//! Findings are diagnostics, not failures: the command exits successfully
//! whenever the book could be read, however many findings it prints.

use crate::cmd::open_ledger;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::{Context as _, Result};
use clap::Args;
use kakeibo_core::compact::compact;
use kakeibo_core::config::load_ledger_config;
use kakeibo_core::export::read_export;
use kakeibo_core::journal::MalformedRow;
use kakeibo_core::{CompiledBook, Finding, Validator};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Validate an exported TSV instead of the ledger journal.
    #[arg(long, value_name = "FILE")]
    pub from: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ValidateOutput {
    entries: usize,
    malformed: Vec<MalformedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unterminated_line: Option<usize>,
    findings: Vec<Finding>,
}

struct Source {
    book: CompiledBook,
    malformed: Vec<MalformedRow>,
    unterminated_line: Option<usize>,
}

fn load_source(args: &ValidateArgs, root: &Path) -> Result<Source> {
    if let Some(path) = &args.from {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let book =
            read_export(&text).with_context(|| format!("failed to import {}", path.display()))?;
        return Ok(Source {
            book,
            malformed: Vec::new(),
            unterminated_line: None,
        });
    }

    let ledger = open_ledger(root)?;
    let scan = ledger.scan().context("failed to read journal")?;
    Ok(Source {
        book: compact(&scan.rows),
        malformed: scan.malformed,
        unterminated_line: scan.unterminated_line,
    })
}

/// Execute `kb validate`.
///
/// # Errors
///
/// Returns an error only if the config, journal or import file cannot be
/// read.
pub fn run_validate(args: &ValidateArgs, output: OutputMode, root: &Path) -> Result<()> {
    let config = load_ledger_config(root).context("failed to load ledger config")?;
    let source = load_source(args, root)?;
    let findings = Validator::from_config(&config).validate(&source.book);

    let result = ValidateOutput {
        entries: source.book.len(),
        malformed: source.malformed,
        unterminated_line: source.unterminated_line,
        findings,
    };

    render_mode(
        output,
        &result,
        |r, w| {
            for row in &r.malformed {
                writeln!(w, "malformed\tline {}\t{}", row.line, row.reason)?;
            }
            if let Some(line) = r.unterminated_line {
                writeln!(w, "unterminated\tline {line}\tno trailing newline")?;
            }
            for finding in &r.findings {
                writeln!(w, "{}\t{finding}", finding.kind())?;
            }
            Ok(())
        },
        |r, w| {
            if !r.malformed.is_empty() {
                pretty_section(w, "Skipped rows")?;
                for row in &r.malformed {
                    writeln!(w, "  line {}: {}", row.line, row.reason)?;
                }
                writeln!(w)?;
            }
            pretty_section(w, "Findings")?;
            if r.findings.is_empty() {
                writeln!(w, "  none")?;
            }
            for finding in &r.findings {
                writeln!(w, "  {finding}")?;
            }
            writeln!(w)?;
            pretty_kv(w, "entries", r.entries.to_string())?;
            pretty_kv(w, "findings", r.findings.len().to_string())?;
            if let Some(line) = r.unterminated_line {
                pretty_kv(w, "unterminated", format!("line {line} has no trailing newline"))?;
            }
            Ok(())
        },
    )
}
