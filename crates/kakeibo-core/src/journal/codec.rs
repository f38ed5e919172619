//! Tab-separated journal row codec.
//!
//! # Row format
//!
//! ```text
//! date \t category \t amount_a \t amount_b \t remark [\t id \t recorded_at \t author]
//! ```
//!
//! - Empty fields are zero-length.
//! - Rows with fewer than 5 fields are padded with empty fields.
//! - A row with 6 or more fields and a non-empty `id` is versioned; any
//!   other row is final.
//! - Rows with more than 8 fields are malformed.
//! - One row per line: fields never contain tab, carriage return or newline.
//!   A single trailing `\r` (CRLF line ending) is tolerated on decode.

use crate::model::{EntryId, Gist, LogRow, RowMeta};

/// Number of economic fields at the start of every row.
pub const GIST_FIELDS: usize = 5;

/// Maximum number of fields in a row.
pub const MAX_FIELDS: usize = 8;

/// Errors from encoding or decoding a journal row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The line splits into more than [`MAX_FIELDS`] fields.
    #[error("expected at most {MAX_FIELDS} tab-separated fields, found {found}")]
    TooManyFields { found: usize },

    /// A field contains a carriage return.
    #[error("carriage return inside field {field}")]
    StrayCarriageReturn { field: usize },

    /// A value cannot be written without breaking the one-line invariant.
    #[error("field `{field}` contains a tab or line break: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

const FIELD_NAMES: [&str; MAX_FIELDS] = [
    "date",
    "category",
    "amount_a",
    "amount_b",
    "remark",
    "id",
    "recorded_at",
    "author",
];

/// Decode one journal line (without its trailing `\n`).
///
/// # Errors
///
/// Returns [`CodecError::TooManyFields`] for rows wider than
/// [`MAX_FIELDS`], or [`CodecError::StrayCarriageReturn`] when a field
/// contains `\r`.
pub fn decode_row(line: &str) -> Result<LogRow, CodecError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() > MAX_FIELDS {
        return Err(CodecError::TooManyFields {
            found: fields.len(),
        });
    }
    if let Some(field) = fields.iter().position(|f| f.contains('\r')) {
        return Err(CodecError::StrayCarriageReturn { field: field + 1 });
    }

    let field = |i: usize| fields.get(i).copied().unwrap_or_default();
    let gist = Gist::new(field(0), field(1), field(2), field(3), field(4));

    let id = field(5);
    if id.is_empty() {
        return Ok(LogRow::final_row(gist));
    }

    Ok(LogRow::versioned(
        gist,
        RowMeta {
            id: EntryId::new(id),
            recorded_at: field(6).to_string(),
            author: field(7).to_string(),
        },
    ))
}

/// Encode a row as one journal line (without trailing newline).
///
/// Final rows are written with 5 fields, versioned rows with 8.
///
/// # Errors
///
/// Returns [`CodecError::InvalidField`] if any value contains a tab,
/// carriage return or newline.
pub fn encode_row(row: &LogRow) -> Result<String, CodecError> {
    let gist = row.gist.fields();
    let fields: Vec<&str> = match &row.meta {
        None => gist.to_vec(),
        Some(meta) => gist
            .iter()
            .copied()
            .chain([
                meta.id.as_str(),
                meta.recorded_at.as_str(),
                meta.author.as_str(),
            ])
            .collect(),
    };

    for (i, value) in fields.iter().enumerate() {
        if value.contains(['\t', '\r', '\n']) {
            return Err(CodecError::InvalidField {
                field: FIELD_NAMES[i],
                value: (*value).to_string(),
            });
        }
    }
    Ok(fields.join("\t"))
}

/// Encode a row with its trailing newline.
///
/// # Errors
///
/// Same as [`encode_row`].
pub fn encode_line(row: &LogRow) -> Result<String, CodecError> {
    let mut line = encode_row(row)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RowKind;

    #[test]
    fn decodes_final_row() {
        let row = decode_row("2024-01-01\t日常\t-500\t\tコンビニ").unwrap();
        assert_eq!(row.kind(), RowKind::Final);
        assert_eq!(row.gist, Gist::new("2024-01-01", "日常", "-500", "", "コンビニ"));
    }

    #[test]
    fn pads_short_rows() {
        let row = decode_row("2024-01-01\t日常").unwrap();
        assert_eq!(row.gist, Gist::new("2024-01-01", "日常", "", "", ""));
        assert!(row.meta.is_none());
    }

    #[test]
    fn blank_line_is_an_empty_final_row() {
        let row = decode_row("").unwrap();
        assert_eq!(row.kind(), RowKind::Final);
        assert!(row.gist.is_empty());
    }

    #[test]
    fn decodes_versioned_row() {
        let row =
            decode_row("2024-01-01\t月額\t-5000\t\tShop\t10\t2024-01-01T09:00:00\triku").unwrap();
        assert_eq!(row.kind(), RowKind::Version);
        let meta = row.meta.unwrap();
        assert_eq!(meta.id, EntryId::from(10));
        assert_eq!(meta.recorded_at, "2024-01-01T09:00:00");
        assert_eq!(meta.author, "riku");
    }

    #[test]
    fn six_field_row_is_versioned_without_metadata() {
        let row = decode_row("2024-01-01\t日常\t-1\t\t\t42").unwrap();
        let meta = row.meta.unwrap();
        assert_eq!(meta.id, EntryId::from(42));
        assert!(meta.recorded_at.is_empty());
        assert!(meta.author.is_empty());
    }

    #[test]
    fn empty_id_field_means_final() {
        let row = decode_row("2024-01-01\t日常\t-1\t\t\t\t2024-01-01T00:00:00\triku").unwrap();
        assert_eq!(row.kind(), RowKind::Final);
    }

    #[test]
    fn decodes_tombstone() {
        let row = decode_row("\t\t\t\t\t10\t2024-03-01T00:00:00\tanju").unwrap();
        assert_eq!(row.kind(), RowKind::Tombstone);
    }

    #[test]
    fn tolerates_crlf_line_ending() {
        let row = decode_row("2024-01-01\t日常\t-1\t\tx\r").unwrap();
        assert_eq!(row.gist.remark, "x");
    }

    #[test]
    fn rejects_wide_rows() {
        let err = decode_row("a\tb\tc\td\te\tf\tg\th\ti").unwrap_err();
        assert_eq!(err, CodecError::TooManyFields { found: 9 });
    }

    #[test]
    fn rejects_inner_carriage_return() {
        let err = decode_row("2024-01-01\tbad\rcat\t1\t\t").unwrap_err();
        assert_eq!(err, CodecError::StrayCarriageReturn { field: 2 });
    }

    #[test]
    fn encodes_final_row_with_five_fields() {
        let row = LogRow::final_row(Gist::new("2024-01-01", "日常", "-500", "", "Shop"));
        assert_eq!(encode_row(&row).unwrap(), "2024-01-01\t日常\t-500\t\tShop");
    }

    #[test]
    fn encodes_tombstone_with_eight_fields() {
        let row = LogRow::tombstone(EntryId::from(10), "2024-03-01T00:00:00", "anju");
        assert_eq!(
            encode_line(&row).unwrap(),
            "\t\t\t\t\t10\t2024-03-01T00:00:00\tanju\n"
        );
    }

    #[test]
    fn rejects_tab_in_remark() {
        let row = LogRow::final_row(Gist::new("2024-01-01", "日常", "-1", "", "a\tb"));
        let err = encode_row(&row).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { field: "remark", .. }));
    }

    #[test]
    fn rejects_newline_in_author() {
        let row = LogRow::tombstone(EntryId::from(1), "", "ri\nku");
        let err = encode_row(&row).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { field: "author", .. }));
    }
}
