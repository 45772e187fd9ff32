//! Fuzz target: validation over arbitrary field text.
//!
//! Splits the input into eight fields on NUL and validates. Must never panic,
//! and a record that passes must have no field errors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use recruit::{validate, ApplicationRecord, Catalog, Field};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut record = ApplicationRecord::default();
    for (field, value) in Field::ALL.iter().zip(text.split('\0')) {
        record.set(*field, value);
    }

    let result = validate(&record, &Catalog::default());
    if result.is_valid() {
        assert!(result.errors().is_empty());
    }
    assert!(result.error(Field::Experience).is_none());
});
