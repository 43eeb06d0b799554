//! Evaluation context for patient calculations

use crate::error::{EvalError, EvalResult};
use chrono::NaiveDateTime;
use hivcare_model::{MetadataCatalog, PatientDataSource};
use indexmap::IndexMap;
use serde_json::Value;

/// Everything a calculation may read besides the cohort itself
///
/// The reference time is always explicit. Calculations never consult the
/// wall clock, so re-running with the same context gives the same answer.
#[derive(Clone)]
pub struct CalculationContext<'a> {
    /// Reference time ("now") for every date comparison
    pub now: NaiveDateTime,
    /// Concept and program codes
    pub catalog: &'a MetadataCatalog,
    /// Host patient records
    pub data: &'a dyn PatientDataSource,
    /// Free-form parameters passed by the caller
    pub parameters: IndexMap<String, Value>,
}

impl<'a> CalculationContext<'a> {
    pub fn new(now: NaiveDateTime, catalog: &'a MetadataCatalog, data: &'a dyn PatientDataSource) -> Self {
        Self {
            now,
            catalog,
            data,
            parameters: IndexMap::new(),
        }
    }

    /// Set a parameter value
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Get a parameter value
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Get a parameter that must be present
    pub fn required_parameter(&self, name: &str) -> EvalResult<&Value> {
        self.parameter(name).ok_or_else(|| EvalError::missing_parameter(name))
    }
}

impl std::fmt::Debug for CalculationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculationContext")
            .field("now", &self.now)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hivcare_model::NoOpPatientDataSource;

    #[test]
    fn test_parameters() {
        let catalog = MetadataCatalog::default();
        let data = NoOpPatientDataSource::new();
        let now = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap().and_hms_opt(0, 0, 0).unwrap();

        let ctx = CalculationContext::new(now, &catalog, &data).with_parameter("months", 6);
        assert_eq!(ctx.parameter("months"), Some(&Value::from(6)));
        assert!(matches!(
            ctx.required_parameter("missing"),
            Err(EvalError::MissingParameter { .. })
        ));
    }
}
