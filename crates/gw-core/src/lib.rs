//! Galton-Watson outbreak statistics drivers.
//!
//! This library provides the orchestration around `gw-math`:
//! - Exit codes for CLI operations
//! - Solver configuration loading and validation
//! - Structured logging setup
//! - CSV parameter tables in, CSV result tables out
//! - The `generations`, `fecundity` and `summary` commands
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod exit_codes;
pub mod fecundity;
pub mod generations;
pub mod logging;
pub mod summary;
pub mod table;

use thiserror::Error;

use exit_codes::ExitCode;
use table::TableError;

/// Errors surfaced by the driver commands.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Math(#[from] gw_math::Error),

    #[error("parameter row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: gw_math::Error,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl DriverError {
    /// Map onto the process exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            DriverError::Math(err) | DriverError::Row { source: err, .. } => {
                ExitCode::from_math_error(err)
            }
            DriverError::Table(err) => err.exit_code(),
        }
    }
}
