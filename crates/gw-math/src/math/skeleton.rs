//! Single-skeleton statistics of an epidemic branching process.
//!
//! Along the immortal line of a supercritical process every immortal
//! individual is followed by a geometric number `G` of doomed renewals,
//! `P(G <= g) = 1 - gamma^(g+1)`, where `gamma = f'(q)`. Combined with the
//! epidemic growth rate these give the per-parameter-set summary that the
//! generations table reports.

use serde::Serialize;

use super::branching::{BranchingProcess, BranchingProcessFactory, FixedPointTolerance};
use super::growth_rate::{theta_solve_with, RootSolverOptions};
use crate::error::{require_positive, Result};

/// Epidemic parameter set: gamma latent period, gamma infectious period and
/// the reproduction number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpidemicParameters {
    pub latent_mean: f64,
    pub latent_dispersion: f64,
    pub infectious_mean: f64,
    pub infectious_dispersion: f64,
    pub r0: f64,
}

impl EpidemicParameters {
    /// Every parameter must be finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        require_positive("latent_mean", self.latent_mean)?;
        require_positive("latent_dispersion", self.latent_dispersion)?;
        require_positive("infectious_mean", self.infectious_mean)?;
        require_positive("infectious_dispersion", self.infectious_dispersion)?;
        require_positive("r0", self.r0)?;
        Ok(())
    }

    /// Negative Binomial offspring law with mean `r0` and shape equal to the
    /// infectious-period dispersion.
    pub fn offspring_process(&self, tolerance: FixedPointTolerance) -> Result<BranchingProcess> {
        BranchingProcessFactory::build_with_tolerance(
            self.r0,
            Some(self.infectious_dispersion),
            tolerance,
        )
    }
}

/// Derived statistics for one parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkeletonSummary {
    /// Exponential growth rate.
    pub lambda: f64,
    pub doubling_time: f64,
    /// Negative Binomial shape.
    pub k: f64,
    /// Negative Binomial success probability.
    pub p: f64,
    pub q: f64,
    pub gamma: f64,
    /// Mean size of a doomed renewal run.
    pub geom_mean: f64,
    pub geom_st_dev: f64,
    /// Expected duration of the doomed renewals on one skeleton step.
    pub expected_duration: f64,
}

impl SkeletonSummary {
    /// Compute the summary for `params`.
    pub fn compute(
        params: &EpidemicParameters,
        solver: &RootSolverOptions,
        tolerance: FixedPointTolerance,
    ) -> Result<Self> {
        params.validate()?;
        let lambda = theta_solve_with(
            params.latent_mean,
            params.latent_dispersion,
            params.infectious_mean,
            params.infectious_dispersion,
            params.r0,
            solver,
        )?;
        let bp = params.offspring_process(tolerance)?;
        let q = bp.q()?;
        let gamma = bp.gamma()?;
        let k = params.infectious_dispersion;
        Ok(Self {
            lambda,
            doubling_time: std::f64::consts::LN_2 / lambda,
            k,
            p: k / (k + params.r0),
            q,
            gamma,
            geom_mean: geometric_mean(gamma),
            geom_st_dev: geometric_st_dev(gamma),
            expected_duration: expected_duration(params, q, gamma),
        })
    }

    /// `P(G <= g)` for `g = 0..=cdf_max`.
    pub fn cdf(&self, cdf_max: usize) -> Vec<f64> {
        skeleton_cdf(self.gamma, cdf_max)
    }
}

/// `gamma / (1 - gamma)`.
pub fn geometric_mean(gamma: f64) -> f64 {
    gamma / (1.0 - gamma)
}

/// `sqrt(gamma) / (1 - gamma)`.
pub fn geometric_st_dev(gamma: f64) -> f64 {
    gamma.sqrt() / (1.0 - gamma)
}

/// `1 - gamma^(g+1)` for `g = 0..=cdf_max`.
pub fn skeleton_cdf(gamma: f64, cdf_max: usize) -> Vec<f64> {
    let mut power = gamma;
    let mut out = Vec::with_capacity(cdf_max + 1);
    for _ in 0..=cdf_max {
        out.push(1.0 - power);
        power *= gamma;
    }
    out
}

/// Mean duration of the doomed renewals hanging off one skeleton step.
///
/// Each renewal costs a latent period plus the time to the infection that
/// continues the line; the latter has mean
/// `0.5 i_mu (i_kappa + 1) / ((1 - q) r0 + i_kappa)`.
pub fn expected_duration(params: &EpidemicParameters, q: f64, gamma: f64) -> f64 {
    let k = params.infectious_dispersion;
    let mean_maternal_birth = 0.5 * params.infectious_mean * (k + 1.0) / ((1.0 - q) * params.r0 + k);
    (params.latent_mean + mean_maternal_birth) * geometric_mean(gamma)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    fn reference() -> EpidemicParameters {
        EpidemicParameters {
            latent_mean: 3.5,
            latent_dispersion: 4.0,
            infectious_mean: 5.5,
            infectious_dispersion: 0.3,
            r0: 2.0,
        }
    }

    #[test]
    fn summary_for_reference_row() {
        let summary = SkeletonSummary::compute(
            &reference(),
            &RootSolverOptions::default(),
            FixedPointTolerance::default(),
        )
        .unwrap();
        assert!(approx_eq(summary.lambda, 0.141_560_35, 1e-6));
        assert!(approx_eq(summary.doubling_time, 2.0f64.ln() / summary.lambda, 1e-12));
        assert_eq!(summary.k, 0.3);
        assert!(approx_eq(summary.p, 0.3 / 2.3, 1e-15));
        assert!(summary.q > 0.0 && summary.q < 1.0);
        assert!(summary.gamma > 0.0 && summary.gamma < 1.0);
        assert!(approx_eq(
            summary.geom_mean,
            summary.gamma / (1.0 - summary.gamma),
            1e-12
        ));
        assert!(summary.expected_duration > 0.0);
    }

    #[test]
    fn cdf_is_increasing_towards_one() {
        let cdf = skeleton_cdf(0.5, 4);
        assert_eq!(cdf, vec![0.5, 0.75, 0.875, 0.9375, 0.96875]);
        assert_eq!(skeleton_cdf(0.3, 0).len(), 1);
    }

    #[test]
    fn geometric_moments() {
        assert!(approx_eq(geometric_mean(0.5), 1.0, 1e-15));
        assert!(approx_eq(geometric_st_dev(0.25), 0.5 / 0.75, 1e-15));
    }

    #[test]
    fn expected_duration_formula() {
        let params = reference();
        let (q, gamma) = (0.6, 0.4);
        let birth = 0.5 * 5.5 * 1.3 / (0.4 * 2.0 + 0.3);
        let expected = (3.5 + birth) * (0.4 / 0.6);
        assert!(approx_eq(expected_duration(&params, q, gamma), expected, 1e-12));
    }

    #[test]
    fn invalid_parameters_fail_before_solving() {
        let mut params = reference();
        params.infectious_mean = 0.0;
        let err = SkeletonSummary::compute(
            &params,
            &RootSolverOptions::default(),
            FixedPointTolerance::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::InvalidParameter {
                name: "infectious_mean",
                ..
            }
        ));
    }
}
