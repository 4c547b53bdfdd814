//! Galton-Watson branching process math.
//!
//! Single-type branching processes with Poisson or Negative Binomial
//! offspring laws (and finite mixtures of them), their extinction
//! statistics, the Harris-Sevastyanov decomposition of a supercritical
//! process, and the exponential growth rate of an epidemic with
//! gamma-distributed latent and infectious periods.

pub mod error;
pub mod math;

pub use error::{Error, ErrorKind, Result};
pub use math::branching::{BranchingProcess, BranchingProcessFactory, FixedPointTolerance};
pub use math::fecundity;
pub use math::growth_rate::{theta_solve, theta_solve_with, RootSolverOptions};
pub use math::harris_sevastyanov::{self, ExpectationMatrix};
pub use math::laplace::{laplace_exposed, laplace_infectious};
pub use math::mixture::{Mixture, MixtureComponent};
pub use math::offspring::{NegativeBinomial, OffspringLaw, Poisson};
pub use math::skeleton;
pub use math::stable::*;
