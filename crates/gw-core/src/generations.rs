//! `generations`: skeleton statistics for every row of a parameter table.
//!
//! Each row yields the epidemic growth rate, the Negative Binomial offspring
//! law with mean `R0` and shape equal to the infectious dispersion, its
//! extinction statistics and the CDF of the number of doomed renewals per
//! step along the immortal line.

use std::path::{Path, PathBuf};

use gw_math::skeleton::{EpidemicParameters, SkeletonSummary};
use tracing::{debug, info};

use crate::config::SolverConfig;
use crate::table::{self, TableError, INPUT_COLUMNS};
use crate::DriverError;

/// Derived columns, in output order.
pub const SUMMARY_COLUMNS: [&str; 8] = [
    "lambda",
    "doubling_time",
    "k",
    "p",
    "q",
    "gamma",
    "geom_mean",
    "geom_st_dev",
];

/// Optional column emitted with `--with-duration`.
pub const DURATION_COLUMN: &str = "expected_duration";

#[derive(Debug, Clone)]
pub struct GenerationsOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Largest renewal count `g` in the CDF columns `0..=cdf_max`.
    pub cdf_max: usize,
    pub with_duration: bool,
}

/// One computed output row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationsRow {
    pub params: EpidemicParameters,
    pub summary: SkeletonSummary,
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationsReport {
    pub rows: usize,
    pub output: PathBuf,
}

/// Read the table, compute every row and write the result table.
pub fn run(options: &GenerationsOptions, config: &SolverConfig) -> Result<GenerationsReport, DriverError> {
    let params = table::read_parameter_table(&options.input)?;
    info!(
        input = %options.input.display(),
        rows = params.len(),
        "loaded parameter table"
    );
    let rows = compute_rows(&params, config)?;
    write_generations(&options.output, &rows, options.cdf_max, options.with_duration)?;
    info!(output = %options.output.display(), rows = rows.len(), "wrote generations table");
    Ok(GenerationsReport {
        rows: rows.len(),
        output: options.output.clone(),
    })
}

/// Compute the skeleton summary of every parameter set, stopping at the first
/// failing row.
pub fn compute_rows(
    params: &[EpidemicParameters],
    config: &SolverConfig,
) -> Result<Vec<GenerationsRow>, DriverError> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let row = i + 1;
            info!(
                row,
                e_mu = p.latent_mean,
                e_kappa = p.latent_dispersion,
                i_mu = p.infectious_mean,
                i_kappa = p.infectious_dispersion,
                r0 = p.r0,
                "computing skeleton statistics"
            );
            let summary = SkeletonSummary::compute(p, &config.root_solver, config.fixed_point)
                .map_err(|source| DriverError::Row { row, source })?;
            debug!(
                row,
                lambda = summary.lambda,
                q = summary.q,
                gamma = summary.gamma,
                geom_mean = summary.geom_mean,
                "derived statistics"
            );
            Ok(GenerationsRow {
                params: *p,
                summary,
            })
        })
        .collect()
}

/// Output header: input columns, derived columns, optional duration, CDF.
pub fn header(cdf_max: usize, with_duration: bool) -> Vec<String> {
    let mut out: Vec<String> = INPUT_COLUMNS
        .iter()
        .chain(SUMMARY_COLUMNS.iter())
        .map(|c| c.to_string())
        .collect();
    if with_duration {
        out.push(DURATION_COLUMN.to_string());
    }
    out.extend((0..=cdf_max).map(|g| g.to_string()));
    out
}

/// One output record, aligned with [`header`].
pub fn record(row: &GenerationsRow, cdf_max: usize, with_duration: bool) -> Vec<String> {
    let s = &row.summary;
    let mut values: Vec<f64> = table::parameter_fields(&row.params).to_vec();
    values.extend([
        s.lambda,
        s.doubling_time,
        s.k,
        s.p,
        s.q,
        s.gamma,
        s.geom_mean,
        s.geom_st_dev,
    ]);
    if with_duration {
        values.push(s.expected_duration);
    }
    values.extend(s.cdf(cdf_max));
    values.into_iter().map(table::format_value).collect()
}

pub fn write_generations(
    path: &Path,
    rows: &[GenerationsRow],
    cdf_max: usize,
    with_duration: bool,
) -> Result<(), TableError> {
    table::write_table(
        path,
        &header(cdf_max, with_duration),
        rows.iter().map(|r| record(r, cdf_max, with_duration)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn header_layout() {
        let h = header(2, false);
        assert_eq!(h.len(), 5 + 8 + 3);
        assert_eq!(h[0], "e->i_mean");
        assert_eq!(h[5], "lambda");
        assert_eq!(h[12], "geom_st_dev");
        assert_eq!(&h[13..], &["0", "1", "2"]);

        let h = header(0, true);
        assert_eq!(h[13], "expected_duration");
        assert_eq!(h[14], "0");
    }

    #[test]
    fn records_align_with_header() {
        let rows = compute_rows(&[reference()], &SolverConfig::default()).unwrap();
        for with_duration in [false, true] {
            let rec = record(&rows[0], 4, with_duration);
            assert_eq!(rec.len(), header(4, with_duration).len());
        }
        let rec = record(&rows[0], 4, false);
        assert_eq!(rec[0], "3.5");
        assert_eq!(rec[7], "0.3");
        let lambda: f64 = rec[5].parse().unwrap();
        assert!((lambda - 0.141_560_35).abs() < 1e-6);
    }

    #[test]
    fn failing_row_is_numbered() {
        let mut bad = reference();
        bad.r0 = -1.0;
        let err = compute_rows(&[reference(), bad], &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, DriverError::Row { row: 2, .. }));
    }
}
