//! `summary`: extinction statistics of one offspring law as JSON.

use gw_math::{
    harris_sevastyanov, BranchingProcessFactory, ExpectationMatrix, FixedPointTolerance,
};
use serde::Serialize;
use tracing::debug;

/// Statistics of one process built from epidemiological parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSummary {
    pub name: &'static str,
    pub r0: f64,
    /// Negative Binomial shape; absent for Poisson offspring.
    pub dispersion: Option<f64>,
    pub mean: f64,
    pub q: f64,
    pub gamma: f64,
    pub rho: f64,
    pub supercritical: bool,
    /// Present only for supercritical processes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harris_sevastyanov: Option<DecompositionSummary>,
}

/// Immortal/doomed decomposition at one generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecompositionSummary {
    pub generation: u32,
    pub expectation_matrix: ExpectationMatrix,
    pub expected_progeny_from_immortal: f64,
}

pub fn summarize(
    r0: f64,
    dispersion: Option<f64>,
    generation: u32,
    tolerance: FixedPointTolerance,
) -> gw_math::Result<ProcessSummary> {
    let bp = BranchingProcessFactory::build_with_tolerance(r0, dispersion, tolerance)?;
    let supercritical = bp.is_supercritical()?;
    let harris_sevastyanov = if supercritical {
        Some(DecompositionSummary {
            generation,
            expectation_matrix: harris_sevastyanov::expectation_matrix(&bp, generation)?,
            expected_progeny_from_immortal: harris_sevastyanov::expectation_z_n_from_immortal(
                &bp, generation,
            )?,
        })
    } else {
        None
    };
    let summary = ProcessSummary {
        name: bp.name(),
        r0,
        dispersion,
        mean: bp.expected_number_of_offspring(),
        q: bp.q()?,
        gamma: bp.gamma()?,
        rho: bp.rho()?,
        supercritical,
        harris_sevastyanov,
    };
    debug!(name = summary.name, q = summary.q, gamma = summary.gamma, "summarized process");
    Ok(summary)
}
