//! Extinction statistics over a grid of Negative Binomial offspring laws.
//!
//! The shape `k` runs over an arithmetic axis and the success probability `p`
//! over a geometrically decreasing one. Cells whose mean `k (1-p) / p` is at
//! most 1 are not supercritical and report `q = gamma = 1` without
//! iterating.

use serde::Serialize;

use super::branching::{BranchingProcess, FixedPointTolerance};
use super::offspring::NegativeBinomial;
use super::stable::is_close;
use crate::error::{require_positive, Error, Result};

/// Largest axis the grid builders will materialize.
pub const MAX_AXIS_LEN: usize = 1_000_000;

/// Ordered values along one grid dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridAxis {
    values: Vec<f64>,
}

impl GridAxis {
    /// `step, 2 step, ...` while the value does not exceed `end`.
    ///
    /// Values are accumulated by repeated addition.
    pub fn arithmetic(step: f64, end: f64) -> Result<Self> {
        require_positive("step", step)?;
        require_positive("end", end)?;
        if end / step > MAX_AXIS_LEN as f64 {
            return Err(Error::invalid("step", step, "axis would be too long"));
        }
        let mut values = Vec::new();
        let mut k = 0.0;
        loop {
            k += step;
            if end < k {
                break;
            }
            values.push(k);
        }
        Ok(Self { values })
    }

    /// `1/factor, 1/factor^2, ...` while the value is at least `end`.
    pub fn geometric_decreasing(factor: f64, end: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 1.0 {
            return Err(Error::invalid("factor", factor, "must be finite and > 1"));
        }
        if end.is_nan() || end <= 0.0 || end >= 1.0 {
            return Err(Error::invalid("end", end, "must lie in (0, 1)"));
        }
        if -end.ln() / factor.ln() > MAX_AXIS_LEN as f64 {
            return Err(Error::invalid("factor", factor, "axis would be too long"));
        }
        let mut values = Vec::new();
        let mut p = 1.0;
        loop {
            p /= factor;
            if p < end {
                break;
            }
            values.push(p);
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Which statistic a monotonicity diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStatistic {
    Q,
    Gamma,
}

/// Direction along which a statistic unexpectedly increased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridDirection {
    /// Increasing `k` at fixed `p`.
    K,
    /// Decreasing `p` at fixed `k`.
    P,
}

/// A cell whose value exceeds its predecessor along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonotonicityViolation {
    pub statistic: GridStatistic,
    pub direction: GridDirection,
    pub k: f64,
    pub p: f64,
    pub value: f64,
    pub previous: f64,
}

/// `q` and `gamma` for every `(k, p)` cell, indexed `[k][p]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FecundityGrid {
    pub ks: Vec<f64>,
    pub ps: Vec<f64>,
    pub q: Vec<Vec<f64>>,
    pub gamma: Vec<Vec<f64>>,
}

impl FecundityGrid {
    pub fn compute(ks: &GridAxis, ps: &GridAxis, tolerance: FixedPointTolerance) -> Result<Self> {
        tolerance.validate()?;
        let mut q = vec![vec![1.0; ps.len()]; ks.len()];
        let mut gamma = vec![vec![1.0; ps.len()]; ks.len()];
        for (i, &k) in ks.values().iter().enumerate() {
            for (j, &p) in ps.values().iter().enumerate() {
                if k * (1.0 - p) / p <= 1.0 {
                    continue;
                }
                let bp = BranchingProcess::from_law(NegativeBinomial::new(k, p)?)
                    .with_tolerance(tolerance)?;
                q[i][j] = bp.q()?;
                gamma[i][j] = bp.gamma()?;
            }
        }
        Ok(Self {
            ks: ks.values().to_vec(),
            ps: ps.values().to_vec(),
            q,
            gamma,
        })
    }

    /// Cells where `q` or `gamma` grows with `k` or as `p` shrinks, beyond
    /// the fixed-point tolerance.
    pub fn monotonicity_violations(&self, tolerance: &FixedPointTolerance) -> Vec<MonotonicityViolation> {
        let mut out = Vec::new();
        for (statistic, table) in [(GridStatistic::Q, &self.q), (GridStatistic::Gamma, &self.gamma)] {
            for (i, row) in table.iter().enumerate() {
                for (j, &value) in row.iter().enumerate() {
                    let neighbours = [
                        (GridDirection::K, i.checked_sub(1).map(|pi| table[pi][j])),
                        (GridDirection::P, j.checked_sub(1).map(|pj| row[pj])),
                    ];
                    for (direction, previous) in neighbours {
                        let Some(previous) = previous else { continue };
                        if value > previous
                            && !is_close(value, previous, tolerance.rel_tol, tolerance.abs_tol)
                        {
                            out.push(MonotonicityViolation {
                                statistic,
                                direction,
                                k: self.ks[i],
                                p: self.ps[j],
                                value,
                                previous,
                            });
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_axis_accumulates() {
        let axis = GridAxis::arithmetic(0.5, 2.0).unwrap();
        assert_eq!(axis.values(), &[0.5, 1.0, 1.5, 2.0]);
        assert!(GridAxis::arithmetic(0.0, 2.0).is_err());
        assert!(GridAxis::arithmetic(1.0, -2.0).is_err());
        assert!(GridAxis::arithmetic(3.0, 2.0).unwrap().is_empty());
    }

    #[test]
    fn geometric_axis_decreases() {
        let axis = GridAxis::geometric_decreasing(2.0, 0.1).unwrap();
        assert_eq!(axis.values(), &[0.5, 0.25, 0.125]);
        assert!(GridAxis::geometric_decreasing(1.0, 0.1).is_err());
        assert!(GridAxis::geometric_decreasing(2.0, 1.0).is_err());
        assert!(GridAxis::geometric_decreasing(2.0, 0.0).is_err());
    }

    #[test]
    fn subcritical_cells_are_one() {
        let ks = GridAxis::arithmetic(0.5, 1.0).unwrap();
        let ps = GridAxis::geometric_decreasing(2.0, 0.4).unwrap();
        let grid = FecundityGrid::compute(&ks, &ps, FixedPointTolerance::default()).unwrap();
        // k (1-p)/p = k for p = 0.5, never above 1 here.
        assert_eq!(grid.q, vec![vec![1.0], vec![1.0]]);
        assert_eq!(grid.gamma, vec![vec![1.0], vec![1.0]]);
    }

    #[test]
    fn supercritical_cells_match_process() {
        let ks = GridAxis::arithmetic(1.0, 2.0).unwrap();
        let ps = GridAxis::geometric_decreasing(3.0, 0.3).unwrap();
        let grid = FecundityGrid::compute(&ks, &ps, FixedPointTolerance::default()).unwrap();
        // p = 1/3, k = 1: NB with mean 2, q = 1/2.
        assert!((grid.q[0][0] - 0.5).abs() < 1e-8);
        assert!(grid.q[1][0] < grid.q[0][0]);
        assert!(grid.gamma[1][0] < grid.gamma[0][0]);
        assert!(grid
            .monotonicity_violations(&FixedPointTolerance::default())
            .is_empty());
    }

    #[test]
    fn detects_injected_violation() {
        let grid = FecundityGrid {
            ks: vec![1.0, 2.0],
            ps: vec![0.5],
            q: vec![vec![0.4], vec![0.6]],
            gamma: vec![vec![0.3], vec![0.2]],
        };
        let violations = grid.monotonicity_violations(&FixedPointTolerance::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].statistic, GridStatistic::Q);
        assert_eq!(violations[0].direction, GridDirection::K);
        assert_eq!(violations[0].k, 2.0);
    }
}
