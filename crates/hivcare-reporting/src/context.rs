//! Report evaluation context

use crate::error::ReportError;
use crate::query::FieldValue;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameter values and reference date for one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportContext {
    /// Reference date ("today") for windows relative to the run
    pub now: NaiveDate,
    /// Parameter values by name
    #[serde(default)]
    pub parameters: IndexMap<String, FieldValue>,
}

impl ReportContext {
    pub fn new(now: NaiveDate) -> Self {
        Self {
            now,
            parameters: IndexMap::new(),
        }
    }

    /// Set a parameter value
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set_parameter(name, value);
        self
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Get a parameter value; `Null` counts as absent
    pub fn parameter(&self, name: &str) -> Option<&FieldValue> {
        self.parameters.get(name).filter(|v| !v.is_null())
    }

    /// Context with the same reference date and no parameters
    pub fn child(&self) -> Self {
        Self::new(self.now)
    }

    /// Get a date parameter
    pub fn date_parameter(&self, name: &str) -> Result<NaiveDate, ReportError> {
        match self.parameter(name) {
            Some(FieldValue::Date(date)) => Ok(*date),
            Some(FieldValue::Text(text)) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|e| ReportError::invalid_parameter(name, format!("'{}' is not a date: {}", text, e))),
            Some(other) => Err(ReportError::invalid_parameter(
                name,
                format!("expected a date, found {}", other.type_name()),
            )),
            None => Err(ReportError::missing_parameter(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_parameter() {
        let ctx = ReportContext::new(date(2024, 10, 1))
            .with_parameter("startDate", date(2024, 7, 1))
            .with_parameter("endDate", "2024-09-30")
            .with_parameter("bad", "soon")
            .with_parameter("none", FieldValue::Null);

        assert_eq!(ctx.date_parameter("startDate"), Ok(date(2024, 7, 1)));
        assert_eq!(ctx.date_parameter("endDate"), Ok(date(2024, 9, 30)));
        assert!(matches!(ctx.date_parameter("bad"), Err(ReportError::InvalidParameter { .. })));
        assert!(matches!(ctx.date_parameter("none"), Err(ReportError::MissingParameter { .. })));
        assert!(matches!(ctx.date_parameter("other"), Err(ReportError::MissingParameter { .. })));
    }
}
