// error.rs - Failure conditions shared by the lattice, estimators and driver

use thiserror::Error;

/// Everything that can go wrong while configuring or analysing a run.
///
/// A rejected Metropolis proposal is not an error and never shows up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IsingError {
    #[error("lattice must be at least 2x2, got {rows}x{cols}")]
    DegenerateLattice { rows: usize, cols: usize },

    #[error("spin configuration has {len} entries, expected {expected}")]
    SpinCountMismatch { len: usize, expected: usize },

    #[error("spin value {value} at site {index} is not +1 or -1")]
    InvalidSpin { index: usize, value: i8 },

    #[error("{statistic} needs at least {required} samples, series has {len}")]
    InsufficientSamples {
        statistic: &'static str,
        required: usize,
        len: usize,
    },

    #[error("series has zero variance, {statistic} is undefined")]
    ZeroVariance { statistic: &'static str },

    #[error("{name} must be positive, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown dynamics '{0}', expected 'glauber' or 'kawasaki'")]
    UnknownDynamics(String),

    #[error("{0} is not the mean of a per-sample term, it has no naive error")]
    NoNaiveError(&'static str),

    #[error("unknown error method '{0}', expected 'naive', 'jackknife' or 'bootstrap'")]
    UnknownErrorMethod(String),

    #[error("unknown initial state '{0}', expected 'aligned', 'random' or 'striped'")]
    UnknownInitialState(String),
}

pub type Result<T> = std::result::Result<T, IsingError>;

/// Reject zero, negative and NaN values of a physical constant.
///
/// `+inf` passes: an infinite temperature is a valid limit for the acceptance test.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(IsingError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_values_pass_through() {
        assert_eq!(require_positive("temperature", 2.5), Ok(2.5));
        assert_eq!(require_positive("temperature", f64::INFINITY), Ok(f64::INFINITY));
    }

    #[test]
    fn zero_negative_and_nan_are_rejected() {
        assert!(require_positive("temperature", 0.0).is_err());
        assert!(require_positive("temperature", -1.0).is_err());
        assert!(require_positive("temperature", f64::NAN).is_err());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = IsingError::DegenerateLattice { rows: 1, cols: 8 };
        assert_eq!(err.to_string(), "lattice must be at least 2x2, got 1x8");
    }
}
