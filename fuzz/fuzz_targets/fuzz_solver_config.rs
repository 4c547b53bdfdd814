//! Fuzz target for solver configuration parsing.

#![no_main]

use gw_core::config::SolverConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<SolverConfig>(data) {
        let _ = config.validate();
    }
});
