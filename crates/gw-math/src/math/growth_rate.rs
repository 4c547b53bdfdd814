//! Exponential growth rate (Malthusian parameter) of an epidemic.
//!
//! With gamma-distributed latent and infectious periods the generation-time
//! Laplace transform is `L(theta) = L_E(theta) L_I(theta)`, and the growth
//! rate `theta` solves the Euler-Lotka equation
//!
//! `L(theta) = 1 / R0`.
//!
//! `L` decreases strictly from `+inf` (at the latent-period pole
//! `-kappa_E / mu_E`) to 0, so the root is unique: positive when `R0 > 1`,
//! negative when `R0 < 1`.
//!
//! The solver is a safeguarded Newton iteration: a finite-difference Newton
//! step is taken whenever it stays inside the current sign-change bracket,
//! and the bracket is bisected otherwise.

use serde::{Deserialize, Serialize};

use super::laplace::{laplace_exposed, laplace_infectious, GammaPeriod};
use crate::error::{require_positive, Error, Result};

/// Bracket expansions allowed before giving up.
const MAX_BRACKET_STEPS: usize = 200;

/// Options for the growth-rate root search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootSolverOptions {
    /// Starting point of the search.
    pub initial_guess: f64,
    /// Required absolute residual of the equation at the returned root.
    pub residual_tol: f64,
    /// Newton/bisection iteration cap.
    pub max_iterations: usize,
}

impl Default for RootSolverOptions {
    fn default() -> Self {
        Self {
            initial_guess: 0.1,
            residual_tol: 1e-9,
            max_iterations: 200,
        }
    }
}

impl RootSolverOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.initial_guess.is_finite() {
            return Err(Error::invalid(
                "initial_guess",
                self.initial_guess,
                "must be finite",
            ));
        }
        require_positive("residual_tol", self.residual_tol)?;
        if self.max_iterations == 0 {
            return Err(Error::invalid(
                "max_iterations",
                0.0,
                "must allow at least one iteration",
            ));
        }
        Ok(())
    }
}

/// Euler-Lotka residual `L_E(theta) L_I(theta) - 1/R0`.
#[derive(Debug, Clone, Copy)]
struct EulerLotka {
    latent: GammaPeriod,
    infectious: GammaPeriod,
    inverse_r0: f64,
}

impl EulerLotka {
    fn residual(&self, theta: f64) -> f64 {
        laplace_exposed(theta, self.latent.mean, self.latent.shape)
            * laplace_infectious(theta, self.infectious.mean, self.infectious.shape)
            - self.inverse_r0
    }

    /// Central difference where both sides lie in the domain, forward
    /// difference next to the pole.
    fn derivative(&self, theta: f64, lower: f64) -> f64 {
        let h = 1e-7 * theta.abs().max(1e-3);
        if theta - h > lower {
            (self.residual(theta + h) - self.residual(theta - h)) / (2.0 * h)
        } else {
            (self.residual(theta + h) - self.residual(theta)) / h
        }
    }
}

/// Growth rate for the given latent period `Gamma(e_kappa, e_mu/e_kappa)`,
/// infectious period `Gamma(i_kappa, i_mu/i_kappa)` and reproduction number.
pub fn theta_solve(e_mu: f64, e_kappa: f64, i_mu: f64, i_kappa: f64, r0: f64) -> Result<f64> {
    theta_solve_with(e_mu, e_kappa, i_mu, i_kappa, r0, &RootSolverOptions::default())
}

/// [`theta_solve`] with explicit solver options.
pub fn theta_solve_with(
    e_mu: f64,
    e_kappa: f64,
    i_mu: f64,
    i_kappa: f64,
    r0: f64,
    options: &RootSolverOptions,
) -> Result<f64> {
    options.validate()?;
    let equation = EulerLotka {
        latent: GammaPeriod::new(e_mu, e_kappa)?,
        infectious: GammaPeriod::new(i_mu, i_kappa)?,
        inverse_r0: 1.0 / require_positive("r0", r0)?,
    };
    let pole = equation.latent.divergence_point();

    let mut x = options.initial_guess;
    if x <= pole {
        x = 0.5 * pole;
    }
    let (mut lo, mut hi) = bracket(&equation, x, pole)?;

    let mut best = (x, equation.residual(x));
    let mut iterations = 0;
    while iterations < options.max_iterations {
        iterations += 1;
        let fx = equation.residual(x);
        if fx.abs() < best.1.abs() {
            best = (x, fx);
        }
        if fx == 0.0 {
            break;
        }
        if fx > 0.0 {
            lo = x;
        } else {
            hi = x;
        }
        let slope = equation.derivative(x, pole);
        let newton = x - fx / slope;
        let next = if slope.is_finite() && slope < 0.0 && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
        let converged = (next - x).abs() <= f64::EPSILON * x.abs().max(1.0)
            || (hi - lo) <= f64::EPSILON * lo.abs().max(hi.abs()).max(1.0);
        x = next;
        if converged {
            let fx = equation.residual(x);
            if fx.abs() < best.1.abs() {
                best = (x, fx);
            }
            break;
        }
    }

    let (theta, residual) = best;
    if !(residual.abs() <= options.residual_tol) {
        return Err(Error::ConvergenceFailure {
            routine: "theta_solve",
            iterations,
            residual: residual.abs(),
        });
    }
    Ok(theta)
}

/// Find `lo < hi` with `residual(lo) > 0 > residual(hi)`, starting at `x`.
fn bracket(equation: &EulerLotka, x: f64, pole: f64) -> Result<(f64, f64)> {
    let fx = equation.residual(x);
    if fx == 0.0 {
        return Ok((x, x));
    }
    if fx > 0.0 {
        let mut lo = x;
        let mut step = x.abs().max(0.1);
        for _ in 0..MAX_BRACKET_STEPS {
            let hi = x + step;
            if equation.residual(hi) < 0.0 {
                return Ok((lo, hi));
            }
            lo = hi;
            step *= 2.0;
        }
    } else {
        let hi = x;
        let mut lo = x;
        for _ in 0..MAX_BRACKET_STEPS {
            lo = pole + 0.5 * (lo - pole);
            if equation.residual(lo) > 0.0 {
                return Ok((lo, hi));
            }
        }
    }
    Err(Error::ConvergenceFailure {
        routine: "theta_solve bracketing",
        iterations: MAX_BRACKET_STEPS,
        residual: fx.abs(),
    })
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

    #[test]
    fn reference_parameter_set() {
        let theta = theta_solve(3.5, 4.0, 5.5, 0.3, 2.0).unwrap();
        assert!(approx_eq(theta, 0.141_560_35, 1e-6), "theta={theta}");
        assert!(approx_eq(laplace_exposed(theta, 3.5, 4.0), 0.626_820_15, 1e-6));
        assert!(approx_eq(laplace_infectious(theta, 5.5, 0.3), 0.797_676_98, 1e-6));
    }

    #[test]
    fn root_satisfies_equation() {
        let (e_mu, e_kappa, i_mu, i_kappa, r0) = (2.0, 2.0, 4.0, 3.0, 3.0);
        let theta = theta_solve(e_mu, e_kappa, i_mu, i_kappa, r0).unwrap();
        let lhs = laplace_exposed(theta, e_mu, e_kappa) * laplace_infectious(theta, i_mu, i_kappa);
        assert!(approx_eq(lhs, 1.0 / r0, 1e-9));
        assert!(theta > 0.0);
    }

    #[test]
    fn threshold_reproduction_number_gives_zero_growth() {
        let theta = theta_solve(3.0, 2.0, 5.0, 1.5, 1.0).unwrap();
        assert!(approx_eq(theta, 0.0, 1e-9));
    }

    #[test]
    fn subcritical_epidemic_decays() {
        // Below threshold only the latent factor varies: (1 + theta)^(-1) = 1/0.5.
        let theta = theta_solve(1.0, 1.0, 5.0, 2.0, 0.5).unwrap();
        assert!(approx_eq(theta, -0.5, 1e-9), "theta={theta}");
    }

    #[test]
    fn larger_r0_grows_faster() {
        let slow = theta_solve(3.5, 4.0, 5.5, 0.3, 1.5).unwrap();
        let fast = theta_solve(3.5, 4.0, 5.5, 0.3, 4.0).unwrap();
        assert!(fast > slow);
    }

    #[test]
    fn unit_infectious_shape_is_solvable() {
        let theta = theta_solve(3.0, 2.0, 5.0, 1.0, 2.5).unwrap();
        assert!(theta.is_finite() && theta > 0.0);
    }

    #[test]
    fn rejects_non_positive_inputs() {
        assert!(matches!(
            theta_solve(0.0, 4.0, 5.5, 0.3, 2.0),
            Err(Error::InvalidParameter { name: "mean", .. })
        ));
        assert!(theta_solve(3.5, -4.0, 5.5, 0.3, 2.0).is_err());
        assert!(theta_solve(3.5, 4.0, 5.5, 0.0, 2.0).is_err());
        assert!(matches!(
            theta_solve(3.5, 4.0, 5.5, 0.3, 0.0),
            Err(Error::InvalidParameter { name: "r0", .. })
        ));
    }

    #[test]
    fn iteration_cap_reports_convergence_failure() {
        let options = RootSolverOptions {
            initial_guess: 5.0,
            residual_tol: 1e-15,
            max_iterations: 1,
        };
        let err = theta_solve_with(3.5, 4.0, 5.5, 0.3, 2.0, &options).unwrap_err();
        assert!(matches!(err, Error::ConvergenceFailure { routine: "theta_solve", .. }));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = RootSolverOptions {
            residual_tol: 0.0,
            ..RootSolverOptions::default()
        };
        assert!(theta_solve_with(3.5, 4.0, 5.5, 0.3, 2.0, &options).is_err());
    }
}
