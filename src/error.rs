//! Error taxonomy for the quantitative analysis boundaries.
//!
//! Numeric excursions inside an algorithm (sums marginally above 1, negative
//! rounding dust) are clamped silently and are *not* errors; everything in
//! this module is detected at the boundary of an operation and surfaced
//! before any partial result is published.

use thiserror::Error;

/// Failure of an analysis boundary operation.
#[derive(Debug, Error)]
pub enum Error {
    /// A numeric option or parameter is out of its documented range.
    #[error("invalid settings: {reason}")]
    InvalidSettings { reason: String },

    /// An analysis was invoked out of order (or twice).
    #[error("missing prerequisite: {what}")]
    MissingPrerequisite { what: String },

    /// A cut-set literal has no basic-event descriptor in the graph.
    #[error("graph inconsistency: no basic event behind index {index}")]
    GraphInconsistency { index: i32 },

    /// A distribution produced a non-finite draw before clamping.
    #[error("distribution of '{id}' sampled a non-finite value ({value})")]
    DistributionDomain { id: String, value: f64 },

    /// The run configuration could not be understood.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Reading an input or writing a report failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn settings(reason: impl Into<String>) -> Self {
        Error::InvalidSettings { reason: reason.into() }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Error::Config { reason: reason.into() }
    }

    /// Process exit code for the command line: 1 for I/O failures, 2 for
    /// validation failures, 3 for analysis failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Io(_) => 1,
            Error::InvalidSettings { .. } | Error::GraphInconsistency { .. } | Error::Config { .. } => 2,
            Error::MissingPrerequisite { .. } | Error::DistributionDomain { .. } => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.exit_code(), 1);
        assert_eq!(Error::settings("x").exit_code(), 2);
        assert_eq!(Error::config("x").exit_code(), 2);
        assert_eq!(Error::GraphInconsistency { index: 3 }.exit_code(), 2);
        assert_eq!(Error::MissingPrerequisite { what: "x".into() }.exit_code(), 3);
        assert_eq!(Error::DistributionDomain { id: "a".into(), value: f64::NAN }.exit_code(), 3);
    }
}
