//! Laplace transforms of gamma-distributed epidemic periods.
//!
//! # Parameterization
//!
//! Periods are described by their **mean** `mu` and **shape** (dispersion)
//! `kappa`: `Gamma(kappa, scale = mu / kappa)`.
//!
//! - Latent period `E`: `L_E(theta) = (1 + theta mu / kappa)^(-kappa)`.
//! - Time to infection within the infectious period: an infectious period
//!   `I ~ Gamma(kappa, mu/kappa)` with the infection instant uniform on
//!   `[0, I]`. For `theta > 0`
//!   `L_I(theta) = (1 - (1 + x)^(-(kappa - 1))) / ((kappa - 1) x)` with
//!   `x = theta mu / kappa`.
//!
//! The generation time is `E` plus the time to infection, so its transform is
//! the product `L_E L_I`.

use serde::Serialize;

use super::stable::one_minus_pow_neg;
use crate::error::{require_positive, Result};

/// Shapes this close to 1 use the `ln(1+x)/x` limit of `L_I`.
const UNIT_SHAPE_EPS: f64 = 1e-12;

/// Laplace transform of a `Gamma(kappa, mu/kappa)` latent period.
///
/// Returns `+inf` where the transform diverges (`theta <= -kappa/mu`).
pub fn laplace_exposed(theta: f64, mu: f64, kappa: f64) -> f64 {
    let base = 1.0 + theta * mu / kappa;
    if base <= 0.0 {
        return f64::INFINITY;
    }
    base.powf(-kappa)
}

/// Laplace transform of the uniformly placed infection instant within a
/// `Gamma(kappa, mu/kappa)` infectious period.
///
/// `theta <= 0` returns the limiting value 1.0, removing the singularity at
/// `theta = 0`.
pub fn laplace_infectious(theta: f64, mu: f64, kappa: f64) -> f64 {
    if theta <= 0.0 {
        return 1.0;
    }
    let x = theta * mu / kappa;
    let a = kappa - 1.0;
    if a.abs() < UNIT_SHAPE_EPS {
        return x.ln_1p() / x;
    }
    one_minus_pow_neg(x, a) / (a * x)
}

/// A gamma-distributed period given by mean and shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GammaPeriod {
    pub mean: f64,
    pub shape: f64,
}

impl GammaPeriod {
    pub fn new(mean: f64, shape: f64) -> Result<Self> {
        require_positive("mean", mean)?;
        require_positive("shape", shape)?;
        Ok(Self { mean, shape })
    }

    /// Scale parameter `mean / shape`.
    pub fn scale(&self) -> f64 {
        self.mean / self.shape
    }

    /// Smallest `theta` at which `laplace_exposed` is finite (exclusive).
    pub fn divergence_point(&self) -> f64 {
        -self.shape / self.mean
    }
}
