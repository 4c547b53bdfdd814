//! Harris-Sevastyanov decomposition of a supercritical process.
//!
//! A supercritical process conditioned on survival splits into individuals
//! with infinite lines of descent ("immortal", type a) and individuals whose
//! lines die out ("doomed", type b). The two-type process has PGFs
//!
//! - `f_a(a, b) = (f((1-q) a + q b) - q) / (1 - q)`
//! - `f_b(b) = f(q b) / q`
//!
//! and mean matrix `M = mu [[1, q/(1-q)], [0, rho]]`, where the doomed
//! sub-process has mean `gamma = rho mu < 1`.

use serde::Serialize;

use super::branching::BranchingProcess;
use crate::error::{require_unit_interval, Error, Result};

/// 2x2 non-negative matrix of expected offspring counts by type.
///
/// Row `i`, column `j` holds the expected number of type-`j` children of a
/// type-`i` parent, with type 0 immortal and type 1 doomed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpectationMatrix {
    entries: [[f64; 2]; 2],
}

impl ExpectationMatrix {
    pub fn new(entries: [[f64; 2]; 2]) -> Self {
        Self { entries }
    }

    pub fn identity() -> Self {
        Self::new([[1.0, 0.0], [0.0, 1.0]])
    }

    pub fn entries(&self) -> [[f64; 2]; 2] {
        self.entries
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.entries[row][col]
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &ExpectationMatrix) -> ExpectationMatrix {
        let a = &self.entries;
        let b = &other.entries;
        let mut out = [[0.0; 2]; 2];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = a[i][0] * b[0][j] + a[i][1] * b[1][j];
            }
        }
        ExpectationMatrix::new(out)
    }

    /// Expected total population reached from one immortal ancestor:
    /// the state vector `(1, 0)` applied to the matrix.
    pub fn total_from_immortal(&self) -> f64 {
        self.entries[0][0] + self.entries[0][1]
    }

    /// Entry-wise closeness, `|x - y| <= abs_tol + rel_tol |y|`.
    pub fn approx_eq(&self, other: &ExpectationMatrix, rel_tol: f64, abs_tol: f64) -> bool {
        self.entries
            .iter()
            .flatten()
            .zip(other.entries.iter().flatten())
            .all(|(x, y)| (x - y).abs() <= abs_tol + rel_tol * y.abs())
    }
}

/// Statistics of a process already checked to be supercritical.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Supercritical {
    q: f64,
    mu: f64,
    rho: f64,
}

impl Supercritical {
    fn check(bp: &BranchingProcess) -> Result<Self> {
        let q = bp.q()?;
        if !(q > 0.0 && q < 1.0) {
            return Err(Error::InvariantViolation(format!(
                "Harris-Sevastyanov transform needs 0 < q < 1, got q={q} for {}",
                bp.name()
            )));
        }
        let mu = bp.expected_number_of_offspring();
        if mu <= 1.0 {
            return Err(Error::InvariantViolation(format!(
                "Harris-Sevastyanov transform needs mu > 1, got mu={mu} for {}",
                bp.name()
            )));
        }
        let rho = bp.rho()?;
        if !(rho > 0.0 && rho < mu) {
            return Err(Error::InvariantViolation(format!(
                "Harris-Sevastyanov transform needs 0 < rho < mu, got rho={rho}, mu={mu}"
            )));
        }
        Ok(Self { q, mu, rho })
    }

    /// `(1 - rho^n) / (1 - rho) * q / (1 - q)`.
    fn cross_term(&self, n: u32) -> f64 {
        let odds = self.q / (1.0 - self.q);
        if n == 1 {
            return odds;
        }
        (1.0 - self.rho.powf(n as f64)) / (1.0 - self.rho) * odds
    }
}

/// Reject generations whose expectations overflow `f64`.
fn require_finite(n: u32, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        return Ok(());
    }
    Err(Error::invalid(
        "n",
        n as f64,
        "generation too large: expectation overflows f64",
    ))
}

/// PGF pair `(f_a, f_b)` of the decomposed process at blend points `(a, b)`.
///
/// A process that is not supercritical has no immortal line; the pair then
/// degenerates to `(0, f(b))`.
pub fn probability_generating_functions(bp: &BranchingProcess, a: f64, b: f64) -> Result<(f64, f64)> {
    require_unit_interval("a", a)?;
    require_unit_interval("b", b)?;
    let q = bp.q()?;
    if q == 1.0 || bp.expected_number_of_offspring() <= 1.0 {
        return Ok((0.0, bp.pgf(b, 0)));
    }
    let fa = (bp.pgf((1.0 - q) * a + q * b, 0) - q) / (1.0 - q);
    let fb = bp.pgf(q * b, 0) / q;
    Ok((fa, fb))
}

/// `n`-th power of the expectation matrix,
/// `M^n = mu^n [[1, c_n], [0, rho^n]]` with
/// `c_n = (1 - rho^n) / (1 - rho) * q / (1 - q)`.
pub fn expectation_matrix(bp: &BranchingProcess, n: u32) -> Result<ExpectationMatrix> {
    let stats = Supercritical::check(bp)?;
    let scale = stats.mu.powf(n as f64);
    let entries = [
        [scale, scale * stats.cross_term(n)],
        [0.0, (stats.mu * stats.rho).powf(n as f64)],
    ];
    require_finite(n, entries.as_flattened())?;
    Ok(ExpectationMatrix::new(entries))
}

/// Expected size of generation `n` descended from one immortal ancestor,
/// counting both immortal and doomed individuals.
pub fn expectation_z_n_from_immortal(bp: &BranchingProcess, n: u32) -> Result<f64> {
    let stats = Supercritical::check(bp)?;
    let growth = stats.mu.powf(n as f64);
    let doomed = (1.0 - stats.rho.powf(n as f64)) / (1.0 - stats.rho) * stats.q / (1.0 - stats.q);
    let total = (1.0 + doomed) * growth;
    require_finite(n, &[total])?;
    Ok(total)
}
