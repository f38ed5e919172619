//! Tab-separated rendering of the book.
//!
//! An export is a fixed header line followed by one line per entry in book
//! order, five fields each. Exports can be read back into a book.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::compact::CompiledBook;
use crate::error::ErrorCode;
use crate::journal::codec::{self, CodecError, GIST_FIELDS};
use crate::model::Gist;

/// Column labels of an export.
pub const EXPORT_HEADER: [&str; GIST_FIELDS] = ["日付", "部類", "リク", "あん", "備考"];

/// Directory, relative to the ledger root, holding archived exports.
pub const ARCHIVE_DIR: &str = "downloads";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("export does not start with the expected header")]
    MissingHeader,

    #[error("line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: CodecError,
    },

    #[error("line {line}: expected {GIST_FIELDS} fields, found {found}")]
    ExtraFields { line: usize, found: usize },
}

impl ExportError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::StorageUnavailable,
            Self::MissingHeader | Self::Row { .. } | Self::ExtraFields { .. } => {
                ErrorCode::MalformedRow
            }
        }
    }
}

/// Write the header and every entry of `book` to `out`.
///
/// # Errors
///
/// Propagates write failures from `out`.
pub fn export_tsv<W: Write>(book: &CompiledBook, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", EXPORT_HEADER.join("\t"))?;
    for entry in book {
        writeln!(out, "{}", entry.fields().join("\t"))?;
    }
    out.flush()
}

/// Render `book` as an export string.
#[must_use]
pub fn export_string(book: &CompiledBook) -> String {
    let mut out = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = export_tsv(book, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse an export back into a book.
///
/// Blank lines are skipped. The entries are re-sorted, so a hand-edited
/// export still yields a valid book.
///
/// # Errors
///
/// Returns [`ExportError::MissingHeader`] if the first line is not the
/// export header, or a row error for lines that are not five plain fields.
pub fn read_export(text: &str) -> Result<CompiledBook, ExportError> {
    let mut lines = text.lines().enumerate();
    let header_ok = lines.next().is_some_and(|(_, header)| {
        header.trim_end_matches('\r').split('\t').eq(EXPORT_HEADER)
    });
    if !header_ok {
        return Err(ExportError::MissingHeader);
    }

    let mut entries: Vec<Gist> = Vec::new();
    for (index, raw) in lines {
        let line = index + 1;
        if raw.trim_end_matches('\r').is_empty() {
            continue;
        }
        let found = raw.split('\t').count();
        if found > GIST_FIELDS {
            return Err(ExportError::ExtraFields { line, found });
        }
        let row = codec::decode_row(raw).map_err(|source| ExportError::Row { line, source })?;
        entries.push(row.gist);
    }
    Ok(CompiledBook::from_entries(entries))
}

/// Where the export for `date` is archived under `ledger_root`.
#[must_use]
pub fn archive_path(ledger_root: &Path, date: NaiveDate) -> PathBuf {
    ledger_root
        .join(ARCHIVE_DIR)
        .join(format!("kakeibo-{}.tsv", date.format("%Y-%m-%d")))
}

/// Write the export of `book` to the archive for `date`, replacing any
/// archive already written that day.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the archive cannot be written.
pub fn write_archive(
    ledger_root: &Path,
    date: NaiveDate,
    book: &CompiledBook,
) -> Result<PathBuf, ExportError> {
    let path = archive_path(ledger_root, date);
    let io_err = |source| ExportError::Io {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(&path, export_string(book)).map_err(io_err)?;
    info!(path = %path.display(), entries = book.len(), "archived export");
    Ok(path)
}
