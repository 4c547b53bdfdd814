//! Fuzz target for CSV parameter table loading.
//!
//! Arbitrary bytes must produce rows or a `TableError`, never a panic.

#![no_main]

use std::path::Path;

use gw_core::table::read_parameters;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let reader = csv::Reader::from_reader(data);
    if let Ok(rows) = read_parameters(reader, Path::new("fuzz.csv")) {
        for row in rows {
            assert!(row.validate().is_ok());
        }
    }
});
