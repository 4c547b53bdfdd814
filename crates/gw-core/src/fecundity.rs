//! `fecundity`: extinction statistics over a Negative Binomial `(k, p)` grid.

use std::path::{Path, PathBuf};

use gw_math::fecundity::{FecundityGrid, GridAxis, GridStatistic};
use tracing::{info, warn};

use crate::config::SolverConfig;
use crate::table::{self, TableError};
use crate::DriverError;

/// Output file for the extinction-probability grid.
pub const Q_FILE: &str = "negative_binomial_q.csv";
/// Output file for the doomed-lineage mean grid.
pub const GAMMA_FILE: &str = "negative_binomial_gamma.csv";

#[derive(Debug, Clone)]
pub struct FecundityOptions {
    pub output_dir: PathBuf,
    /// Arithmetic `k` axis: step and inclusive end.
    pub k_step: f64,
    pub k_end: f64,
    /// Geometric `p` axis: division factor and inclusive lower end.
    pub p_factor: f64,
    pub p_end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FecundityReport {
    pub k_values: usize,
    pub p_values: usize,
    pub violations: usize,
    pub q_path: PathBuf,
    pub gamma_path: PathBuf,
}

/// Compute the grid, log monotonicity diagnostics and write both tables.
pub fn run(options: &FecundityOptions, config: &SolverConfig) -> Result<FecundityReport, DriverError> {
    let ks = GridAxis::arithmetic(options.k_step, options.k_end)?;
    let ps = GridAxis::geometric_decreasing(options.p_factor, options.p_end)?;
    info!(k_values = ks.len(), p_values = ps.len(), "computing fecundity grid");

    let grid = FecundityGrid::compute(&ks, &ps, config.fixed_point)?;

    let violations = grid.monotonicity_violations(&config.fixed_point);
    for v in &violations {
        warn!(
            statistic = ?v.statistic,
            direction = ?v.direction,
            k = v.k,
            p = v.p,
            value = v.value,
            previous = v.previous,
            "statistic increased along the grid"
        );
    }

    let q_path = options.output_dir.join(Q_FILE);
    let gamma_path = options.output_dir.join(GAMMA_FILE);
    write_grid(&q_path, &grid, GridStatistic::Q)?;
    write_grid(&gamma_path, &grid, GridStatistic::Gamma)?;
    info!(
        output_dir = %options.output_dir.display(),
        violations = violations.len(),
        "wrote fecundity tables"
    );

    Ok(FecundityReport {
        k_values: ks.len(),
        p_values: ps.len(),
        violations: violations.len(),
        q_path,
        gamma_path,
    })
}

/// Header `k, p_1, p_2, ...` and one row per `k`.
pub fn write_grid(path: &Path, grid: &FecundityGrid, statistic: GridStatistic) -> Result<(), TableError> {
    let values = match statistic {
        GridStatistic::Q => &grid.q,
        GridStatistic::Gamma => &grid.gamma,
    };
    let header: Vec<String> = std::iter::once("k".to_string())
        .chain(grid.ps.iter().map(|&p| table::format_value(p)))
        .collect();
    let rows = grid.ks.iter().zip(values).map(|(&k, row)| {
        std::iter::once(k)
            .chain(row.iter().copied())
            .map(table::format_value)
            .collect::<Vec<_>>()
    });
    table::write_table(path, &header, rows)
}
