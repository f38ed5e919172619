//! `kb init`: create the ledger directory, journal and config.

use crate::output::{OutputMode, pretty_kv, render_mode};
use anyhow::{Context as _, Result};
use kakeibo_core::Ledger;
use kakeibo_core::config::LEDGER_CONFIG_FILE;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct InitOutput {
    root: PathBuf,
    created_journal: bool,
    created_config: bool,
}

/// Execute `kb init`. Creates the ledger skeleton:
///
/// ```text
/// <root>/
///   log.tsv        (empty journal)
///   kakeibo.toml   (default ledger config)
/// ```
///
/// Existing files are left untouched, so running it twice is harmless.
///
/// # Errors
///
/// Returns an error if the directory or either file cannot be created.
pub fn run_init(output: OutputMode, root: &Path) -> Result<()> {
    let report = Ledger::init(root)
        .with_context(|| format!("failed to initialize ledger in {}", root.display()))?;

    let result = InitOutput {
        root: root.to_path_buf(),
        created_journal: report.created_journal,
        created_config: report.created_config,
    };

    render_mode(
        output,
        &result,
        |r, w| {
            writeln!(
                w,
                "init\t{}\tjournal={}\tconfig={}",
                r.root.display(),
                r.created_journal,
                r.created_config
            )
        },
        |r, w| {
            if r.created_journal || r.created_config {
                writeln!(w, "Initialized ledger in {}", r.root.display())?;
            } else {
                writeln!(w, "Ledger already initialized in {}", r.root.display())?;
            }
            pretty_kv(w, "config", r.root.join(LEDGER_CONFIG_FILE).display().to_string())?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  kb submit 2024-01-05 --category 月額 -a -5000 --remark 電気")?;
            writeln!(w, "  kb validate")
        },
    )
}
