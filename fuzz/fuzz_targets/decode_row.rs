#![no_main]

use kakeibo_core::journal::{decode_row, encode_row};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    if line.contains('\n') {
        return;
    }
    let Ok(row) = decode_row(line) else {
        return;
    };
    // Anything that decodes must re-encode and decode to the same row.
    if let Ok(encoded) = encode_row(&row) {
        assert_eq!(decode_row(&encoded).ok(), Some(row));
    }
});
