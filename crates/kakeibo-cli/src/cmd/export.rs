//! `kb export`: print the compiled book as TSV.

use crate::cmd::open_ledger;
use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use chrono::Local;
use clap::Args;
use kakeibo_core::export::{EXPORT_HEADER, export_tsv, write_archive};
use kakeibo_core::{CompiledBook, KeyedEntry};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Also write the export to `downloads/kakeibo-<date>.tsv`.
    #[arg(long)]
    pub archive: bool,

    /// Prefix each row with its entry key: the id, or a negative row
    /// position for final rows. Not re-importable.
    #[arg(long, conflicts_with = "archive")]
    pub keyed: bool,
}

#[derive(Debug, Serialize)]
struct ExportOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    archive: Option<PathBuf>,
    entries: &'a CompiledBook,
}

/// Execute `kb export`.
///
/// TSV goes to stdout in pretty and text modes; the archive path, if any, is
/// reported on stderr so the TSV stays pipeable.
///
/// # Errors
///
/// Returns an error if the journal cannot be read or the archive cannot be
/// written.
pub fn run_export(args: &ExportArgs, output: OutputMode, root: &Path) -> Result<()> {
    let ledger = open_ledger(root)?;
    if args.keyed {
        let entries = ledger.compile_keyed().context("failed to compile book")?;
        return render(output, &entries, |entries, w| write_keyed(entries, w));
    }
    let book = ledger.compile().context("failed to compile book")?;

    let archive = if args.archive {
        let today = Local::now().date_naive();
        Some(write_archive(root, today, &book).context("failed to write archive")?)
    } else {
        None
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if output.is_json() {
        let result = ExportOutput {
            archive,
            entries: &book,
        };
        serde_json::to_writer_pretty(&mut out, &result)?;
        writeln!(out)?;
    } else {
        export_tsv(&book, &mut out)?;
        if let Some(path) = archive {
            eprintln!("archived to {}", path.display());
        }
    }
    Ok(())
}

fn write_keyed(entries: &[KeyedEntry], w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "key\t{}", EXPORT_HEADER.join("\t"))?;
    for entry in entries {
        writeln!(w, "{}\t{}", entry.key, entry.gist.fields().join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kakeibo_core::{EntryId, EntryKey, Gist};

    #[test]
    fn keyed_rows_lead_with_key() {
        let entries = vec![
            KeyedEntry {
                key: EntryKey::for_position(0),
                gist: Gist::new("2024-01-05", "日常", "-1", "", "a"),
            },
            KeyedEntry {
                key: EntryKey::Id(EntryId::from(42)),
                gist: Gist::new("2024-01-06", "日常", "-2", "", "b"),
            },
        ];
        let mut buf = Vec::new();
        write_keyed(&entries, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("key\t日付"));
        assert_eq!(lines[1], "-1\t2024-01-05\t日常\t-1\t\ta");
        assert_eq!(lines[2], "42\t2024-01-06\t日常\t-2\t\tb");
    }
}
