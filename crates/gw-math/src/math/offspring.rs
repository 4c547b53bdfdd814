//! Offspring laws of a single-type Galton-Watson process.
//!
//! Each law exposes its probability generating function (PGF) and the
//! derivatives of it in closed form:
//!
//! - Negative Binomial `NB(k, p)`: `f(s) = (p / (1 - (1-p) s))^k`
//! - Poisson `Poisson(mu)`: `f(s) = exp(mu (s - 1))`
//!
//! The `n`-th derivative of the Negative Binomial PGF is
//! `Gamma(k+n)/Gamma(k) * ((1-p) / (1 - (1-p) s))^n * f(s)`, evaluated in
//! log space so that large `n` or extreme `k` do not overflow.

use serde::Serialize;

use super::mixture::Mixture;
use super::stable::log_rising_factorial;
use crate::error::{require_positive, Error, Result};

/// Negative Binomial offspring law with shape (dispersion) `k` and success
/// probability `p`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NegativeBinomial {
    k: f64,
    p: f64,
}

impl NegativeBinomial {
    pub const NAME: &'static str = "Negative_Binomial";

    /// Create a law from its native `(k, p)` parameterization.
    pub fn new(k: f64, p: f64) -> Result<Self> {
        require_positive("k", k)?;
        if p.is_nan() || p <= 0.0 || p >= 1.0 {
            return Err(Error::invalid("p", p, "must lie in (0, 1)"));
        }
        Ok(Self { k, p })
    }

    /// Create a law from a reproduction number and a dispersion.
    ///
    /// `k = dispersion`, `p = dispersion / (r0 + dispersion)`, so the mean
    /// offspring number is `r0`.
    pub(crate) fn from_epidemic(r0: f64, dispersion: f64) -> Result<Self> {
        require_positive("r0", r0)?;
        require_positive("dispersion", dispersion)?;
        Self::new(dispersion, dispersion / (r0 + dispersion))
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    /// Closed-form mean `k (1-p) / p`.
    pub fn mean(&self) -> f64 {
        self.k * (1.0 - self.p) / self.p
    }

    /// `n`-th derivative of the PGF at `s`.
    pub fn pgf(&self, s: f64, n: u32) -> f64 {
        let (k, p) = (self.k, self.p);
        let denom = 1.0 - (1.0 - p) * s;
        let pgf = (p / denom).powf(k);
        if n == 0 {
            return pgf;
        }
        let log_factor = log_rising_factorial(k, n) + n as f64 * ((1.0 - p).ln() - denom.ln());
        log_factor.exp() * pgf
    }
}

/// Poisson offspring law with mean `mu`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Poisson {
    mu: f64,
}

impl Poisson {
    pub const NAME: &'static str = "Poisson";

    pub fn new(mu: f64) -> Result<Self> {
        require_positive("mu", mu)?;
        Ok(Self { mu })
    }

    /// A homogeneous reproduction number maps directly onto the mean.
    pub(crate) fn from_epidemic(r0: f64) -> Result<Self> {
        require_positive("r0", r0)?;
        Self::new(r0)
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn mean(&self) -> f64 {
        self.mu
    }

    /// `n`-th derivative of the PGF at `s`: `mu^n exp(mu (s-1))`.
    pub fn pgf(&self, s: f64, n: u32) -> f64 {
        let pgf = (self.mu * (s - 1.0)).exp();
        if n == 0 {
            return pgf;
        }
        self.mu.powf(n as f64) * pgf
    }
}

/// Offspring law of a branching process.
#[derive(Debug, Clone)]
pub enum OffspringLaw {
    NegativeBinomial(NegativeBinomial),
    Poisson(Poisson),
    Mixture(Mixture),
}

impl OffspringLaw {
    /// `n`-th derivative of the PGF at `s`.
    pub fn pgf(&self, s: f64, n: u32) -> f64 {
        match self {
            OffspringLaw::NegativeBinomial(law) => law.pgf(s, n),
            OffspringLaw::Poisson(law) => law.pgf(s, n),
            OffspringLaw::Mixture(law) => law.pgf(s, n),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OffspringLaw::NegativeBinomial(_) => NegativeBinomial::NAME,
            OffspringLaw::Poisson(_) => Poisson::NAME,
            OffspringLaw::Mixture(_) => Mixture::NAME,
        }
    }

    /// Mean offspring number from the parameters, without touching the PGF.
    pub fn mean(&self) -> f64 {
        match self {
            OffspringLaw::NegativeBinomial(law) => law.mean(),
            OffspringLaw::Poisson(law) => law.mean(),
            OffspringLaw::Mixture(law) => law.mean(),
        }
    }
}

impl From<NegativeBinomial> for OffspringLaw {
    fn from(law: NegativeBinomial) -> Self {
        OffspringLaw::NegativeBinomial(law)
    }
}

impl From<Poisson> for OffspringLaw {
    fn from(law: Poisson) -> Self {
        OffspringLaw::Poisson(law)
    }
}

impl From<Mixture> for OffspringLaw {
    fn from(law: Mixture) -> Self {
        OffspringLaw::Mixture(law)
    }
}
