//! Journal file → compaction → validation, through the real file format.

use std::fs;
use std::sync::Arc;
use std::thread;

use anyhow::Context as _;
use kakeibo_core::compact::compact;
use kakeibo_core::export::{export_string, read_export};
use kakeibo_core::journal::Journal;
use kakeibo_core::model::{EntryId, Gist, LogRow, RowMeta};
use kakeibo_core::validate::{Finding, SeriesName, Validator};
use tempfile::TempDir;

fn bill(date: &str, id: i64) -> LogRow {
    LogRow::versioned(
        Gist::new(date, "月額", "-5000", "", "Shop"),
        RowMeta {
            id: EntryId::from(id),
            recorded_at: "2024-03-01T09:00:00".to_string(),
            author: "riku".to_string(),
        },
    )
}

fn household() -> Validator {
    Validator::default()
}

fn write_journal(dir: &TempDir, content: &str) -> Journal {
    let path = dir.path().join("log.tsv");
    fs::write(&path, content).unwrap();
    Journal::open(path)
}

#[test]
fn edited_then_tombstoned_series_leaves_nothing_to_validate() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let journal = Journal::open(dir.path().join("log.tsv"));
    journal.append(&bill("2024-01-01", 10))?;
    journal.append(&bill("2024-02-15", 10))?;
    journal
        .append(&LogRow::tombstone(EntryId::from(10), "2024-03-01T09:00:00", "anju"))
        .context("tombstone append")?;

    let book = compact(&journal.read_all()?.rows);
    assert!(book.is_empty());
    assert!(household().validate(&book).is_empty());
    Ok(())
}

#[test]
fn forty_six_day_gap_reports_missing_payment() {
    let dir = TempDir::new().unwrap();
    let journal = write_journal(
        &dir,
        "2024-01-05\t月額\t-5000\t\tShop\n2024-02-20\t月額\t-5000\t\tShop\n",
    );
    let book = compact(&journal.read_all().unwrap().rows);
    let findings = household().validate(&book);
    assert_eq!(
        findings,
        vec![Finding::MissingPayment {
            series: SeriesName::Bill("Shop".to_string()),
            from: "2024-01-05".parse().unwrap(),
            to: "2024-02-20".parse().unwrap(),
        }]
    );
}

#[test]
fn verbatim_final_rows_yield_one_duplicate_finding() {
    let dir = TempDir::new().unwrap();
    let journal = write_journal(
        &dir,
        "2024-01-10\t日常\t-500\t\tコンビニ\n2024-01-10\t日常\t-500\t\tコンビニ\n",
    );
    let book = compact(&journal.read_all().unwrap().rows);
    assert_eq!(book.len(), 2);
    let findings = household().validate(&book);
    assert_eq!(findings.len(), 1);
    assert!(matches!(findings[0], Finding::DuplicateEntry { .. }));
}

#[test]
fn mixed_history_compiles_to_sorted_book() {
    let dir = TempDir::new().unwrap();
    let journal = write_journal(
        &dir,
        concat!(
            "2023-12-25\t給料\t300000\t\t\n",
            "\t\t\t\t\n",
            "2024-01-05\t月額\t-5000\t\tShop\t1704412800\t2024-01-05T08:00:00\triku\n",
            "2024-01-05\t月額\t-5500\t\tShop\t1704412800\t2024-01-05T08:05:00\triku\n",
            "2024-01-25\t給料\t300000\t\t\n",
            "\t\t\t\t\t1704499999\t2024-01-06T00:00:00\tanju\n",
        ),
    );
    let scan = journal.read_all().unwrap();
    assert!(scan.malformed.is_empty());

    let book = compact(&scan.rows);
    assert_eq!(
        book.entries(),
        &[
            Gist::new("2023-12-25", "給料", "300000", "", ""),
            Gist::new("2024-01-05", "月額", "-5500", "", "Shop"),
            Gist::new("2024-01-25", "給料", "300000", "", ""),
        ]
    );
}

#[test]
fn malformed_lines_do_not_abort_compaction() {
    let dir = TempDir::new().unwrap();
    let journal = write_journal(
        &dir,
        "2024-01-05\t日常\t-1\t\ta\n1\t2\t3\t4\t5\t6\t7\t8\t9\n2024-01-06\t日常\t-2\t\tb\n",
    );
    let scan = journal.read_all().unwrap();
    assert_eq!(scan.malformed.len(), 1);
    assert_eq!(compact(&scan.rows).len(), 2);
}

#[test]
fn export_of_compiled_book_validates_the_same() {
    let dir = TempDir::new().unwrap();
    let journal = write_journal(
        &dir,
        "2024-01-05\t月額\t-5000\t\tShop\n2024-01-10\t月額\t-5000\t\tShop\n2024-01-10\t月額\t\t\t\n",
    );
    let book = compact(&journal.read_all().unwrap().rows);
    let reread = read_export(&export_string(&book)).unwrap();
    let validator = household();
    assert_eq!(validator.validate(&reread), validator.validate(&book));
}

#[test]
fn concurrent_appends_never_interleave() {
    let dir = TempDir::new().unwrap();
    let journal = Arc::new(Journal::open(dir.path().join("log.tsv")));

    let handles: Vec<_> = (0..4_i64)
        .map(|worker| {
            let journal = Arc::clone(&journal);
            thread::spawn(move || {
                for n in 0..25 {
                    journal.append(&bill("2024-01-01", worker * 100 + n)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let scan = journal.read_all().unwrap();
    assert_eq!(scan.rows.len(), 100);
    assert!(scan.malformed.is_empty());
    assert_eq!(scan.unterminated_line, None);
}
