//! Fuzz target for the growth-rate root search.
//!
//! Any finite inputs must yield a root or an error; a returned root must
//! satisfy the Euler-Lotka equation.

#![no_main]

use arbitrary::Arbitrary;
use gw_math::{laplace_exposed, laplace_infectious, theta_solve};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    e_mu: f64,
    e_kappa: f64,
    i_mu: f64,
    i_kappa: f64,
    r0: f64,
}

fuzz_target!(|input: Input| {
    let Input {
        e_mu,
        e_kappa,
        i_mu,
        i_kappa,
        r0,
    } = input;
    if let Ok(theta) = theta_solve(e_mu, e_kappa, i_mu, i_kappa, r0) {
        let lhs = laplace_exposed(theta, e_mu, e_kappa) * laplace_infectious(theta, i_mu, i_kappa);
        assert!((lhs - 1.0 / r0).abs() <= 1e-9);
    }
});
