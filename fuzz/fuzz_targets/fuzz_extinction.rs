//! Fuzz target for the extinction-probability iteration.

#![no_main]

use arbitrary::Arbitrary;
use gw_math::{BranchingProcessFactory, FixedPointTolerance};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    r0: f64,
    dispersion: Option<f64>,
}

fuzz_target!(|input: Input| {
    // Keep the iteration cap small so slow critical cases stay cheap.
    let Ok(tolerance) = FixedPointTolerance::new(1e-9, 0.0, 10_000) else {
        return;
    };
    let Ok(bp) = BranchingProcessFactory::build_with_tolerance(input.r0, input.dispersion, tolerance)
    else {
        return;
    };
    if let Ok(q) = bp.q() {
        assert!((0.0..=1.0).contains(&q));
    }
});
