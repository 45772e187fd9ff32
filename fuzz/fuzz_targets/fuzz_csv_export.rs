//! Fuzz target: CSV export of arbitrary field text.
//!
//! Must never panic, and the output always opens with a quoted header cell.

#![no_main]

use libfuzzer_sys::fuzz_target;
use recruit::export::export_csv;
use recruit::{Application, ApplicationRecord, Field};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut record = ApplicationRecord::default();
    for (field, value) in Field::ALL.iter().zip(text.split('\0')) {
        record.set(*field, value);
    }

    let mut out = Vec::new();
    export_csv(&[Application::new(record)], &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    assert!(csv.starts_with('"'));
});
