//! Error types for NARR query resolution and series processing.

use thiserror::Error;

/// Result type alias using NarrError.
pub type NarrResult<T> = Result<T, NarrError>;

/// Primary error type shared by the resolver and the series crates.
#[derive(Debug, Error)]
pub enum NarrError {
    // === Resolution Errors ===
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Requested bounds {requested} fall outside domain coverage {coverage}")]
    OutOfCoverage { requested: String, coverage: String },

    #[error("Invalid geo box: {0}")]
    InvalidBbox(String),

    #[error("Invalid time range: {0}")]
    InvalidTime(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Series Errors ===
    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Observation series is empty")]
    EmptySeries,

    #[error("Inconsistent series: {0}")]
    InconsistentSeries(String),

    // === Collaborator Errors ===
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl NarrError {
    /// Create an InvalidDomain error.
    pub fn invalid_domain(msg: impl Into<String>) -> Self {
        Self::InvalidDomain(msg.into())
    }

    /// Create a ComputationError.
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::ComputationError(msg.into())
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an OutOfCoverage error.
    pub fn out_of_coverage(requested: impl Into<String>, coverage: impl Into<String>) -> Self {
        Self::OutOfCoverage {
            requested: requested.into(),
            coverage: coverage.into(),
        }
    }

    /// Whether the error came from caller input rather than from the data.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            NarrError::InvalidBbox(_)
                | NarrError::InvalidTime(_)
                | NarrError::InvalidParameter { .. }
                | NarrError::OutOfCoverage { .. }
        )
    }
}

impl From<serde_json::Error> for NarrError {
    fn from(err: serde_json::Error) -> Self {
        NarrError::Serialization(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = NarrError::dimension_mismatch("(3, 4)", "(3, 5)");
        assert_eq!(err.to_string(), "Dimension mismatch: expected (3, 4), got (3, 5)");

        let err = NarrError::computation("no valid samples");
        assert_eq!(err.to_string(), "Computation error: no valid samples");
    }

    #[test]
    fn test_input_error_classification() {
        assert!(NarrError::InvalidTime("end before start".into()).is_input_error());
        assert!(NarrError::invalid_parameter("factor", "must be positive").is_input_error());
        assert!(!NarrError::EmptySeries.is_input_error());
        assert!(!NarrError::invalid_domain("empty latitude axis").is_input_error());
    }
}
