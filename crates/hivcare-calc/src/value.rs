//! Calculation results
//!
//! A calculation answers one [`CalculationResult`] per cohort member. Reading a
//! result as the wrong kind is not an error: the typed accessors return `None`
//! and callers treat that as "unknown", which never satisfies a condition.

use chrono::NaiveDateTime;
use hivcare_model::{Cohort, Observation, PatientId};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The value a calculation produced for one patient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CalculationResult {
    /// No value
    #[default]
    Null,
    /// Yes/no answer with an optional message for display
    Boolean { value: bool, message: Option<String> },
    Numeric(Decimal),
    Date(NaiveDateTime),
    Obs(Observation),
    ObsList(Vec<Observation>),
}

impl CalculationResult {
    pub fn boolean(value: bool) -> Self {
        Self::Boolean { value, message: None }
    }

    pub fn flag(value: bool, message: impl Into<String>) -> Self {
        Self::Boolean {
            value,
            message: Some(message.into()),
        }
    }

    /// Wrap an optional datetime, `None` becoming `Null`
    pub fn from_date(date: Option<NaiveDateTime>) -> Self {
        date.map(Self::Date).unwrap_or(Self::Null)
    }

    pub fn from_numeric(value: Option<Decimal>) -> Self {
        value.map(Self::Numeric).unwrap_or(Self::Null)
    }

    pub fn from_obs(obs: Option<Observation>) -> Self {
        obs.map(Self::Obs).unwrap_or(Self::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Boolean { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<Decimal> {
        match self {
            Self::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_obs(&self) -> Option<&Observation> {
        match self {
            Self::Obs(obs) => Some(obs),
            _ => None,
        }
    }

    pub fn as_obs_list(&self) -> Option<&[Observation]> {
        match self {
            Self::ObsList(list) => Some(list),
            _ => None,
        }
    }

    /// Get the type name of this result
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean { .. } => "Boolean",
            Self::Numeric(_) => "Numeric",
            Self::Date(_) => "Date",
            Self::Obs(_) => "Obs",
            Self::ObsList(_) => "ObsList",
        }
    }
}

impl fmt::Display for CalculationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean { value, message: Some(m) } if *value => write!(f, "true ({})", m),
            Self::Boolean { value, .. } => write!(f, "{}", value),
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Obs(obs) => match &obs.value {
                Some(value) => write!(f, "{:?} @ {}", value, obs.obs_datetime),
                None => write!(f, "<empty> @ {}", obs.obs_datetime),
            },
            Self::ObsList(list) => write!(f, "[{} observations]", list.len()),
        }
    }
}

/// Per-patient results of one calculation, in cohort order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalculationResultMap {
    results: IndexMap<PatientId, CalculationResult>,
}

impl CalculationResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, patient: PatientId, result: CalculationResult) {
        self.results.insert(patient, result);
    }

    pub fn get(&self, patient: PatientId) -> Option<&CalculationResult> {
        self.results.get(&patient)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatientId, &CalculationResult)> {
        self.results.iter().map(|(id, result)| (*id, result))
    }

    /// Patients whose result is a boolean `true`
    pub fn patients_that_pass(&self) -> Cohort {
        self.iter()
            .filter(|(_, result)| result.as_bool() == Some(true))
            .map(|(id, _)| id)
            .collect()
    }

    /// True only for a boolean `true`; anything else reads as not passing
    pub fn is_true(&self, patient: PatientId) -> bool {
        self.typed(patient, "Boolean", CalculationResult::as_bool) == Some(true)
    }

    pub fn datetime_for(&self, patient: PatientId) -> Option<NaiveDateTime> {
        self.typed(patient, "Date", CalculationResult::as_datetime)
    }

    pub fn numeric_for(&self, patient: PatientId) -> Option<Decimal> {
        self.typed(patient, "Numeric", CalculationResult::as_numeric)
    }

    pub fn obs_for(&self, patient: PatientId) -> Option<&Observation> {
        self.typed(patient, "Obs", CalculationResult::as_obs)
    }

    pub fn obs_list_for(&self, patient: PatientId) -> Option<&[Observation]> {
        self.typed(patient, "ObsList", CalculationResult::as_obs_list)
    }

    fn typed<'r, T>(
        &'r self,
        patient: PatientId,
        expected: &str,
        read: impl Fn(&'r CalculationResult) -> Option<T>,
    ) -> Option<T> {
        let result = self.results.get(&patient)?;
        let value = read(result);
        if value.is_none() && !result.is_null() {
            log::warn!(
                "Patient {}: expected {} result, found {}; treating as unknown",
                patient,
                expected,
                result.type_name()
            );
        }
        value
    }
}

impl FromIterator<(PatientId, CalculationResult)> for CalculationResultMap {
    fn from_iter<I: IntoIterator<Item = (PatientId, CalculationResult)>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CalculationResultMap {
    type Item = (PatientId, CalculationResult);
    type IntoIter = indexmap::map::IntoIter<PatientId, CalculationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
