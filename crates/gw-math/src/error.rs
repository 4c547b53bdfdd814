//! Error types for the branching process engine.
//!
//! Three kinds of failure exist:
//! - `InvalidParameter`: malformed constructor or call arguments, rejected
//!   before any numerical work happens.
//! - `ConvergenceFailure`: an iteration or root search missed its tolerance.
//! - `InvariantViolation`: a computed quantity is inconsistent with the
//!   mathematics (a bug, never bad input).
//!
//! None of them are retried internally; they propagate to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for branching process operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied an out-of-domain argument.
    InvalidParameter,
    /// A numerical iteration did not meet its tolerance.
    ConvergenceFailure,
    /// Internal consistency check failed.
    InternalInvariantViolation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidParameter => write!(f, "invalid_parameter"),
            ErrorKind::ConvergenceFailure => write!(f, "convergence_failure"),
            ErrorKind::InternalInvariantViolation => write!(f, "internal_invariant_violation"),
        }
    }
}

/// Unified error type for `gw-math`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: String,
    },

    #[error("{routine} did not converge after {iterations} iterations (residual {residual:e})")]
    ConvergenceFailure {
        routine: &'static str,
        iterations: usize,
        residual: f64,
    },

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl Error {
    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid(name: &'static str, value: f64, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            value,
            reason: reason.into(),
        }
    }

    /// Stable numeric code for structured reporting.
    ///
    /// - 30: invalid parameter
    /// - 31: convergence failure
    /// - 32: internal invariant violation
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidParameter { .. } => 30,
            Error::ConvergenceFailure { .. } => 31,
            Error::InvariantViolation(_) => 32,
        }
    }

    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Error::ConvergenceFailure { .. } => ErrorKind::ConvergenceFailure,
            Error::InvariantViolation(_) => ErrorKind::InternalInvariantViolation,
        }
    }

    /// Whether the failure points at a bug rather than at the inputs.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::InvariantViolation(_))
    }
}

/// Require `value` to be finite and strictly positive.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::invalid(name, value, "must be finite and > 0"));
    }
    Ok(value)
}

/// Require `value` to lie in the closed unit interval.
pub(crate) fn require_unit_interval(name: &'static str, value: f64) -> Result<f64> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(Error::invalid(name, value, "must lie in [0, 1]"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::invalid("r0", -1.0, "x").code(), 30);
        assert_eq!(
            Error::ConvergenceFailure {
                routine: "theta_solve",
                iterations: 3,
                residual: 1.0
            }
            .code(),
            31
        );
        assert_eq!(Error::InvariantViolation("q".into()).code(), 32);
    }

    #[test]
    fn kinds_and_internal_flag() {
        let err = Error::InvariantViolation("q out of range".into());
        assert_eq!(err.kind(), ErrorKind::InternalInvariantViolation);
        assert!(err.is_internal());
        assert!(!Error::invalid("k", 0.0, "x").is_internal());
    }

    #[test]
    fn display_names_parameter() {
        let err = Error::invalid("dispersion", 0.0, "must be finite and > 0");
        assert_eq!(
            err.to_string(),
            "invalid parameter dispersion=0: must be finite and > 0"
        );
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(ErrorKind::ConvergenceFailure.to_string(), "convergence_failure");
    }

    #[test]
    fn require_helpers() {
        assert!(require_positive("r0", 2.0).is_ok());
        assert!(require_positive("r0", 0.0).is_err());
        assert!(require_positive("r0", f64::NAN).is_err());
        assert!(require_positive("r0", f64::INFINITY).is_err());
        assert!(require_unit_interval("a", 0.0).is_ok());
        assert!(require_unit_interval("a", 1.0).is_ok());
        assert!(require_unit_interval("a", 1.5).is_err());
        assert!(require_unit_interval("a", f64::NAN).is_err());
    }
}
