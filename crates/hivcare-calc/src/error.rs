//! Evaluation errors for patient calculations
//!
//! Absent data is not an error: a patient without observations simply fails
//! the condition. These variants cover the host failing to answer and
//! callers passing unusable parameters.

use hivcare_diagnostics::{HC0101, HC0102, HC0103, HC0201, HivCareError};
use hivcare_model::DataSourceError;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating a calculation
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    /// The patient data source failed
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    /// A delegated calculation failed
    #[error("Delegated calculation '{calculation}' failed: {source}")]
    Delegated {
        calculation: String,
        #[source]
        source: Box<EvalError>,
    },

    /// A required parameter is missing from the context
    #[error("Missing parameter: {name}")]
    MissingParameter { name: String },

    /// A parameter has an unusable value
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// No calculation registered under a name
    #[error("Unknown calculation: {name}")]
    UnknownCalculation { name: String },
}

impl EvalError {
    /// Wrap an error raised by a calculation this one delegated to
    pub fn delegated(calculation: impl Into<String>, source: EvalError) -> Self {
        Self::Delegated {
            calculation: calculation.into(),
            source: Box::new(source),
        }
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn unknown_calculation(name: impl Into<String>) -> Self {
        Self::UnknownCalculation { name: name.into() }
    }
}

impl From<EvalError> for HivCareError {
    fn from(err: EvalError) -> Self {
        match &err {
            EvalError::DataSource(source) => HivCareError::from(source.clone()),
            EvalError::Delegated { calculation, .. } => {
                HivCareError::evaluation(HC0201, err.to_string()).for_calculation(calculation.clone())
            }
            EvalError::MissingParameter { .. } => HivCareError::configuration(HC0101, err.to_string()),
            EvalError::InvalidParameter { .. } => HivCareError::configuration(HC0102, err.to_string()),
            EvalError::UnknownCalculation { .. } => HivCareError::configuration(HC0103, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivcare_diagnostics::HC0301;

    #[test]
    fn test_delegated_error_message_names_calculation() {
        let err = EvalError::delegated(
            "on-art",
            EvalError::DataSource(DataSourceError::Unavailable("timeout".to_string())),
        );
        assert!(err.to_string().contains("on-art"));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_conversion_codes() {
        let err: HivCareError = EvalError::missing_parameter("now").into();
        assert_eq!(err.code(), HC0101);

        let err: HivCareError = EvalError::delegated("on-art", EvalError::missing_parameter("x")).into();
        assert_eq!(err.code(), HC0201);

        let err: HivCareError =
            EvalError::DataSource(DataSourceError::InvalidData("bad".to_string())).into();
        assert_eq!(err.code(), HC0301);
    }
}
