//! Error types for the forecasting engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Error types for forecasting operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Duplicate timestamp: {0}")]
    DuplicateTimestamp(NaiveDate),

    #[error("Invalid parameter '{param}' = '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },

    #[error("Fit did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("Computation error: {0}")]
    ComputationError(String),
}

/// The three terminal failure classes of a forecast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or insufficient input rows.
    Validation,
    /// Configuration outside its valid domain, rejected before fitting.
    Config,
    /// Optimization failed or produced a degenerate model.
    Fit,
}

impl ForecastError {
    /// Shorthand for an [`ForecastError::InvalidParameter`].
    pub fn invalid_parameter(
        param: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ForecastError::InvalidParameter {
            param: param.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::InvalidInput(_)
            | ForecastError::InsufficientData { .. }
            | ForecastError::InvalidDateFormat(_)
            | ForecastError::DuplicateTimestamp(_) => ErrorKind::Validation,
            ForecastError::InvalidParameter { .. } => ErrorKind::Config,
            ForecastError::NotConverged { .. } | ForecastError::ComputationError(_) => {
                ErrorKind::Fit
            }
        }
    }

    /// Convert to an error code for FFI.
    pub fn to_code(&self) -> i32 {
        match self {
            ForecastError::InvalidInput(_) => 2,
            ForecastError::InsufficientData { .. } => 3,
            ForecastError::InvalidDateFormat(_) => 4,
            ForecastError::DuplicateTimestamp(_) => 5,
            ForecastError::InvalidParameter { .. } => 6,
            ForecastError::NotConverged { .. } => 7,
            ForecastError::ComputationError(_) => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(ForecastError::InvalidInput("test".into()).to_code(), 2);
        assert_eq!(
            ForecastError::InsufficientData { needed: 2, got: 1 }.to_code(),
            3
        );
        assert_eq!(ForecastError::InvalidDateFormat("x".into()).to_code(), 4);
        assert_eq!(ForecastError::DuplicateTimestamp(date).to_code(), 5);
        assert_eq!(
            ForecastError::invalid_parameter("periods", 0, "must be positive").to_code(),
            6
        );
        assert_eq!(ForecastError::NotConverged { iterations: 10 }.to_code(), 7);
        assert_eq!(ForecastError::ComputationError("x".into()).to_code(), 8);
    }

    #[test]
    fn test_error_kind() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            ForecastError::InvalidInput("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ForecastError::DuplicateTimestamp(date).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ForecastError::invalid_parameter("periods", 0, "must be positive").kind(),
            ErrorKind::Config
        );
        assert_eq!(
            ForecastError::NotConverged { iterations: 1 }.kind(),
            ErrorKind::Fit
        );
        assert_eq!(
            ForecastError::ComputationError("singular".into()).kind(),
            ErrorKind::Fit
        );
    }

    #[test]
    fn test_error_display() {
        let err = ForecastError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(
            format!("{}", err),
            "Insufficient data: need at least 2 observations, got 1"
        );

        let err = ForecastError::invalid_parameter("periods", 0, "must be a positive integer");
        assert_eq!(
            format!("{}", err),
            "Invalid parameter 'periods' = '0': must be a positive integer"
        );

        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let err = ForecastError::DuplicateTimestamp(date);
        assert_eq!(format!("{}", err), "Duplicate timestamp: 2024-03-05");

        let err = ForecastError::NotConverged { iterations: 500 };
        assert_eq!(
            format!("{}", err),
            "Fit did not converge within 500 iterations"
        );
    }
}
