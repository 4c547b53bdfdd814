//! Property-based tests for the branching process engine.
//!
//! Uses proptest to check the PGF contract, the extinction fixed point, mixture
//! linearity and Harris-Sevastyanov matrix composition over many parameter sets.

use std::sync::Arc;

use gw_math::harris_sevastyanov::expectation_matrix;
use gw_math::{
    laplace_exposed, laplace_infectious, BranchingProcess, BranchingProcessFactory,
};
use proptest::prelude::*;

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-10;

/// Fixed-point residual tolerance; q is only accurate to the iteration's
/// relative closeness.
const FIXED_POINT_TOL: f64 = 1e-7;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

fn process_strategy() -> impl Strategy<Value = BranchingProcess> {
    (0.2..6.0f64, prop::option::of(0.1..10.0f64)).prop_map(|(r0, dispersion)| {
        BranchingProcessFactory::build(r0, dispersion).expect("valid parameters")
    })
}

/// Mean offspring kept away from 1 so the iteration converges linearly.
fn supercritical_strategy() -> impl Strategy<Value = BranchingProcess> {
    (1.2..6.0f64, prop::option::of(0.2..10.0f64)).prop_map(|(r0, dispersion)| {
        BranchingProcessFactory::build(r0, dispersion).expect("valid parameters")
    })
}

// ============================================================================
// PGF contract
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// f(1) = 1 for every offspring law.
    #[test]
    fn pgf_is_normalized(bp in process_strategy()) {
        let one = bp.pgf(1.0, 0);
        prop_assert!(approx_eq(one, 1.0, 1e-14), "f(1)={}", one);
    }

    /// f'(1) is the epidemic reproduction number the process was built from.
    #[test]
    fn pgf_derivative_at_one_is_mean(bp in process_strategy()) {
        let mean = bp.expected_number_of_offspring();
        prop_assert!(approx_eq(mean, bp.law().mean(), TOL), "f'(1)={} mean={}", mean, bp.law().mean());
    }

    /// PGF and its first two derivatives are non-negative and non-decreasing on [0, 1].
    #[test]
    fn pgf_is_absolutely_monotone(bp in process_strategy(), s in 0.0..0.99f64) {
        for n in 0..3 {
            let lo = bp.pgf(s, n);
            let hi = bp.pgf(s + 0.01, n);
            prop_assert!(lo >= 0.0);
            prop_assert!(hi >= lo - 1e-15, "n={} f({})={} f({})={}", n, s, lo, s + 0.01, hi);
        }
    }
}

// ============================================================================
// Extinction probability
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// q lies in [0, 1] and is a fixed point of the PGF.
    #[test]
    fn q_is_fixed_point(bp in supercritical_strategy()) {
        let q = bp.q().unwrap();
        prop_assert!((0.0..=1.0).contains(&q));
        prop_assert!((bp.pgf(q, 0) - q).abs() < FIXED_POINT_TOL, "f(q)={} q={}", bp.pgf(q, 0), q);
    }

    /// gamma and rho are defined exactly from q and mu.
    #[test]
    fn gamma_and_rho_by_construction(bp in supercritical_strategy()) {
        let q = bp.q().unwrap();
        let gamma = bp.gamma().unwrap();
        prop_assert_eq!(gamma, bp.pgf(q, 1));
        prop_assert_eq!(bp.rho().unwrap(), gamma / bp.expected_number_of_offspring());
        prop_assert!(gamma < 1.0);
    }
}

// ============================================================================
// Mixtures
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Mixture PGF is the weighted sum of component PGFs.
    #[test]
    fn mixture_is_linear(
        a in process_strategy(),
        b in process_strategy(),
        w in 0.01..0.99f64,
        s in 0.0..=1.0f64,
    ) {
        let a = Arc::new(a);
        let b = Arc::new(b);
        let mixture = BranchingProcess::mixture([(Arc::clone(&a), w), (Arc::clone(&b), 1.0 - w)]).unwrap();
        for n in 0..3 {
            let expected = w * a.pgf(s, n) + (1.0 - w) * b.pgf(s, n);
            prop_assert!(approx_eq(mixture.pgf(s, n), expected, TOL));
        }
    }
}

// ============================================================================
// Harris-Sevastyanov matrix
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// M^(n+m) = M^n M^m.
    #[test]
    fn matrix_powers_compose(bp in supercritical_strategy(), n in 1u32..6, m in 1u32..6) {
        let mn = expectation_matrix(&bp, n).unwrap();
        let mm = expectation_matrix(&bp, m).unwrap();
        let direct = expectation_matrix(&bp, n + m).unwrap();
        prop_assert!(direct.approx_eq(&mn.multiply(&mm), 1e-9, 1e-12));
    }
}

// ============================================================================
// Laplace transforms
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Both transforms lie in (0, 1] for non-negative theta.
    #[test]
    fn laplace_transforms_are_bounded(
        theta in 0.0..5.0f64,
        mu in 0.1..20.0f64,
        kappa in 0.05..20.0f64,
    ) {
        let e = laplace_exposed(theta, mu, kappa);
        let i = laplace_infectious(theta, mu, kappa);
        prop_assert!(e > 0.0 && e <= 1.0, "L_E={}", e);
        prop_assert!(i > 0.0 && i <= 1.0 + 1e-12, "L_I={}", i);
    }

    /// The infectious transform is exactly 1 for theta <= 0.
    #[test]
    fn laplace_infectious_left_limit(
        theta in -5.0..=0.0f64,
        mu in 0.1..20.0f64,
        kappa in 0.05..20.0f64,
    ) {
        prop_assert_eq!(laplace_infectious(theta, mu, kappa), 1.0);
    }
}
