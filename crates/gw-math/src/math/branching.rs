//! Single-type Galton-Watson branching processes.
//!
//! A [`BranchingProcess`] wraps an [`OffspringLaw`] and lazily derives the
//! scalar statistics that characterize its long-run behavior:
//!
//! - `mu = f'(1)`: mean offspring number
//! - `q`: extinction probability, the smallest fixed point of `f` in [0, 1]
//! - `gamma = f'(q)`: mean offspring of the doomed (extinction-conditioned)
//!   sub-process
//! - `rho = gamma / mu`
//!
//! Each statistic is computed at most once per process. The cache slots are
//! `OnceLock`s, so a process can be shared across threads: concurrent first
//! readers wait for the single computation instead of racing it.

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use super::mixture::Mixture;
use super::offspring::{NegativeBinomial, OffspringLaw, Poisson};
use super::stable::{is_close, DEFAULT_REL_TOL};
use crate::error::{Error, Result};

/// Closeness criterion for the extinction-probability fixed-point iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedPointTolerance {
    /// Relative tolerance between consecutive iterates.
    pub rel_tol: f64,
    /// Absolute tolerance between consecutive iterates.
    pub abs_tol: f64,
    /// Iteration cap; critical processes converge sub-linearly.
    pub max_iterations: usize,
}

impl Default for FixedPointTolerance {
    fn default() -> Self {
        Self {
            rel_tol: DEFAULT_REL_TOL,
            abs_tol: 0.0,
            max_iterations: 1_000_000,
        }
    }
}

impl FixedPointTolerance {
    /// Create a validated tolerance.
    pub fn new(rel_tol: f64, abs_tol: f64, max_iterations: usize) -> Result<Self> {
        let tolerance = Self {
            rel_tol,
            abs_tol,
            max_iterations,
        };
        tolerance.validate()?;
        Ok(tolerance)
    }

    /// Check that both tolerances are non-negative, at least one is positive,
    /// and the iteration cap is non-zero.
    pub fn validate(&self) -> Result<()> {
        if !self.rel_tol.is_finite() || self.rel_tol < 0.0 {
            return Err(Error::invalid("rel_tol", self.rel_tol, "must be finite and >= 0"));
        }
        if !self.abs_tol.is_finite() || self.abs_tol < 0.0 {
            return Err(Error::invalid("abs_tol", self.abs_tol, "must be finite and >= 0"));
        }
        if self.rel_tol == 0.0 && self.abs_tol == 0.0 {
            return Err(Error::invalid(
                "rel_tol",
                self.rel_tol,
                "rel_tol and abs_tol cannot both be zero",
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid(
                "max_iterations",
                0.0,
                "must allow at least one iteration",
            ));
        }
        Ok(())
    }

    /// Whether two consecutive iterates are numerically close.
    pub fn is_converged(&self, a: f64, b: f64) -> bool {
        is_close(a, b, self.rel_tol, self.abs_tol)
    }
}

#[derive(Debug, Default)]
struct DerivedStats {
    mu: OnceLock<f64>,
    q: OnceLock<Result<f64>>,
    gamma: OnceLock<Result<f64>>,
    rho: OnceLock<Result<f64>>,
}

/// A single-type Galton-Watson process.
#[derive(Debug)]
pub struct BranchingProcess {
    law: OffspringLaw,
    tolerance: FixedPointTolerance,
    stats: DerivedStats,
}

impl BranchingProcess {
    /// Wrap an already validated offspring law.
    pub fn from_law(law: impl Into<OffspringLaw>) -> Self {
        Self {
            law: law.into(),
            tolerance: FixedPointTolerance::default(),
            stats: DerivedStats::default(),
        }
    }

    /// Build a mixture process from `(component, weight)` pairs.
    ///
    /// See [`Mixture::new`] for validation and merging rules.
    pub fn mixture<I>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Arc<BranchingProcess>, f64)>,
    {
        Ok(Self::from_law(Mixture::new(components)?))
    }

    /// Replace the fixed-point tolerance.
    ///
    /// Returns a process with an empty statistics cache, since `q` and the
    /// values derived from it depend on the tolerance.
    pub fn with_tolerance(self, tolerance: FixedPointTolerance) -> Result<Self> {
        tolerance.validate()?;
        Ok(Self {
            law: self.law,
            tolerance,
            stats: DerivedStats::default(),
        })
    }

    pub fn law(&self) -> &OffspringLaw {
        &self.law
    }

    pub fn tolerance(&self) -> &FixedPointTolerance {
        &self.tolerance
    }

    pub fn name(&self) -> &'static str {
        self.law.name()
    }

    /// `n`-th derivative of the PGF at `s`.
    pub fn probability_generating_function(&self, s: f64, n: u32) -> f64 {
        self.law.pgf(s, n)
    }

    /// Short alias for [`Self::probability_generating_function`].
    pub fn pgf(&self, s: f64, n: u32) -> f64 {
        self.law.pgf(s, n)
    }

    /// Mean offspring number `f'(1)`.
    pub fn expected_number_of_offspring(&self) -> f64 {
        *self.stats.mu.get_or_init(|| self.law.pgf(1.0, 1))
    }

    /// Extinction probability.
    ///
    /// Iterates `x <- f(x)` from `x = 0` until consecutive iterates are
    /// close. The iterates increase monotonically to the smallest fixed point
    /// of `f` in [0, 1].
    pub fn q(&self) -> Result<f64> {
        self.stats.q.get_or_init(|| self.extinction_probability()).clone()
    }

    /// Slope of the PGF at the extinction probability, `f'(q)`.
    pub fn gamma(&self) -> Result<f64> {
        self.stats
            .gamma
            .get_or_init(|| Ok(self.law.pgf(self.q()?, 1)))
            .clone()
    }

    /// `gamma / mu`.
    pub fn rho(&self) -> Result<f64> {
        self.stats
            .rho
            .get_or_init(|| Ok(self.gamma()? / self.expected_number_of_offspring()))
            .clone()
    }

    /// Whether the process survives with positive probability.
    pub fn is_supercritical(&self) -> Result<bool> {
        Ok(self.expected_number_of_offspring() > 1.0 && self.q()? < 1.0)
    }

    fn extinction_probability(&self) -> Result<f64> {
        let tolerance = &self.tolerance;
        let mut x = 0.0;
        let mut next = self.law.pgf(x, 0);
        let mut iterations = 0;
        while !tolerance.is_converged(x, next) {
            if iterations >= tolerance.max_iterations || next.is_nan() {
                return Err(Error::ConvergenceFailure {
                    routine: "extinction probability iteration",
                    iterations,
                    residual: (next - x).abs(),
                });
            }
            x = next;
            next = self.law.pgf(x, 0);
            iterations += 1;
        }
        if !(0.0..=1.0).contains(&x) {
            return Err(Error::InvariantViolation(format!(
                "extinction probability {x} outside [0, 1] for {}",
                self.name()
            )));
        }
        Ok(x)
    }
}

impl From<OffspringLaw> for BranchingProcess {
    fn from(law: OffspringLaw) -> Self {
        Self::from_law(law)
    }
}

/// Builds base processes from epidemiological notation.
///
/// The internal `(k, p)` and `mu` parameterizations stay behind this entry
/// point: callers speak in reproduction numbers and dispersions.
pub struct BranchingProcessFactory;

impl BranchingProcessFactory {
    /// Poisson offspring when `dispersion` is `None`, Negative Binomial with
    /// mean `r0` and shape `dispersion` otherwise.
    pub fn build(r0: f64, dispersion: Option<f64>) -> Result<BranchingProcess> {
        let law: OffspringLaw = match dispersion {
            None => Poisson::from_epidemic(r0)?.into(),
            Some(k) => NegativeBinomial::from_epidemic(r0, k)?.into(),
        };
        Ok(BranchingProcess::from_law(law))
    }

    /// Same as [`Self::build`] with an explicit fixed-point tolerance.
    pub fn build_with_tolerance(
        r0: f64,
        dispersion: Option<f64>,
        tolerance: FixedPointTolerance,
    ) -> Result<BranchingProcess> {
        Self::build(r0, dispersion)?.with_tolerance(tolerance)
    }
}
