#![no_main]

use kakeibo_core::compact::compact;
use kakeibo_core::journal::JournalScan;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let scan = JournalScan::from_bytes(data);
    let book = compact(&scan.rows);
    assert!(book.entries().windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(compact(&book.to_rows()), book);
});
