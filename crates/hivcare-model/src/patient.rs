//! Patients and their longitudinal records

use crate::cohort::PatientId;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrative sex as recorded by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[default]
    #[serde(rename = "U")]
    Unknown,
}

impl Sex {
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Unknown => "U",
        }
    }
}

/// Demographic facts about a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub death_date: Option<NaiveDateTime>,
}

impl Patient {
    pub fn new(id: impl Into<PatientId>, sex: Sex) -> Self {
        Self {
            id: id.into(),
            sex,
            birthdate: None,
            dead: false,
            death_date: None,
        }
    }

    pub fn with_birthdate(mut self, birthdate: NaiveDate) -> Self {
        self.birthdate = Some(birthdate);
        self
    }

    /// Mark the patient dead, optionally with the recorded date of death
    pub fn deceased(mut self, death_date: Option<NaiveDateTime>) -> Self {
        self.dead = true;
        self.death_date = death_date;
        self
    }

    /// Whether the patient is alive at `on`
    ///
    /// A death recorded after `on` does not count yet.
    pub fn is_alive(&self, on: NaiveDateTime) -> bool {
        if !self.dead {
            return true;
        }
        matches!(self.death_date, Some(date) if date > on)
    }
}

/// Code of a clinical concept in the host dictionary
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptCode(pub String);

impl ConceptCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Concept code in the CIEL dictionary's padded form (`856AAAA...`)
    pub fn ciel(id: u32) -> Self {
        let id = id.to_string();
        let padding = 36usize.saturating_sub(id.len());
        Self(format!("{}{}", id, "A".repeat(padding)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConceptCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConceptCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// Value recorded for an observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObsValue {
    Numeric(Decimal),
    Coded(ConceptCode),
    Datetime(NaiveDateTime),
    Text(String),
}

/// One timestamped recorded value of a concept for a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub patient: PatientId,
    pub concept: ConceptCode,
    /// Hosts may store an observation whose value was never filled in
    #[serde(default)]
    pub value: Option<ObsValue>,
    pub obs_datetime: NaiveDateTime,
}

impl Observation {
    pub fn new(
        patient: impl Into<PatientId>,
        concept: ConceptCode,
        value: Option<ObsValue>,
        obs_datetime: NaiveDateTime,
    ) -> Self {
        Self {
            patient: patient.into(),
            concept,
            value,
            obs_datetime,
        }
    }

    pub fn numeric(
        patient: impl Into<PatientId>,
        concept: ConceptCode,
        value: impl Into<Decimal>,
        obs_datetime: NaiveDateTime,
    ) -> Self {
        Self::new(patient, concept, Some(ObsValue::Numeric(value.into())), obs_datetime)
    }

    pub fn coded(
        patient: impl Into<PatientId>,
        concept: ConceptCode,
        answer: ConceptCode,
        obs_datetime: NaiveDateTime,
    ) -> Self {
        Self::new(patient, concept, Some(ObsValue::Coded(answer)), obs_datetime)
    }

    pub fn value_numeric(&self) -> Option<Decimal> {
        match &self.value {
            Some(ObsValue::Numeric(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn value_coded(&self) -> Option<&ConceptCode> {
        match &self.value {
            Some(ObsValue::Coded(c)) => Some(c),
            _ => None,
        }
    }

    pub fn value_datetime(&self) -> Option<NaiveDateTime> {
        match &self.value {
            Some(ObsValue::Datetime(dt)) => Some(*dt),
            _ => None,
        }
    }
}

/// Enrollment of a patient in a care program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramEnrollment {
    pub patient: PatientId,
    pub program: String,
    pub date_enrolled: NaiveDateTime,
    #[serde(default)]
    pub date_completed: Option<NaiveDateTime>,
}

impl ProgramEnrollment {
    pub fn new(
        patient: impl Into<PatientId>,
        program: impl Into<String>,
        date_enrolled: NaiveDateTime,
    ) -> Self {
        Self {
            patient: patient.into(),
            program: program.into(),
            date_enrolled,
            date_completed: None,
        }
    }

    pub fn completed(mut self, on: NaiveDateTime) -> Self {
        self.date_completed = Some(on);
        self
    }

    /// Enrolled on or before `on` and not completed by then
    pub fn is_active_on(&self, on: NaiveDateTime) -> bool {
        self.date_enrolled <= on && self.date_completed.is_none_or(|done| done > on)
    }
}

/// A medication order, used to derive treatment status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugOrder {
    pub patient: PatientId,
    pub drug: ConceptCode,
    pub date_activated: NaiveDateTime,
    #[serde(default)]
    pub date_stopped: Option<NaiveDateTime>,
}

impl DrugOrder {
    pub fn new(patient: impl Into<PatientId>, drug: ConceptCode, date_activated: NaiveDateTime) -> Self {
        Self {
            patient: patient.into(),
            drug,
            date_activated,
            date_stopped: None,
        }
    }

    pub fn stopped(mut self, on: NaiveDateTime) -> Self {
        self.date_stopped = Some(on);
        self
    }

    pub fn is_active_on(&self, on: NaiveDateTime) -> bool {
        self.date_activated <= on && self.date_stopped.is_none_or(|stop| stop > on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_ciel_code_padding() {
        let code = ConceptCode::ciel(856);
        assert_eq!(code.as_str().len(), 36);
        assert!(code.as_str().starts_with("856A"));
    }

    #[test]
    fn test_is_alive() {
        let alive = Patient::new(1, Sex::Female);
        assert!(alive.is_alive(at(2024, 1, 1)));

        let dead_no_date = Patient::new(2, Sex::Male).deceased(None);
        assert!(!dead_no_date.is_alive(at(2024, 1, 1)));

        let dies_later = Patient::new(3, Sex::Male).deceased(Some(at(2024, 6, 1)));
        assert!(dies_later.is_alive(at(2024, 1, 1)));
        assert!(!dies_later.is_alive(at(2024, 6, 1)));
    }

    #[test]
    fn test_enrollment_activity() {
        let enrollment = ProgramEnrollment::new(1, "hiv", at(2023, 1, 1)).completed(at(2024, 1, 1));
        assert!(!enrollment.is_active_on(at(2022, 12, 31)));
        assert!(enrollment.is_active_on(at(2023, 1, 1)));
        assert!(!enrollment.is_active_on(at(2024, 1, 1)));
    }

    #[test]
    fn test_value_accessors_never_panic() {
        let empty = Observation::new(1, ConceptCode::ciel(856), None, at(2024, 1, 1));
        assert_eq!(empty.value_numeric(), None);
        assert_eq!(empty.value_coded(), None);

        let coded = Observation::coded(1, ConceptCode::ciel(5272), ConceptCode::ciel(1065), at(2024, 1, 1));
        assert_eq!(coded.value_numeric(), None);
        assert_eq!(coded.value_coded(), Some(&ConceptCode::ciel(1065)));
    }

    #[test]
    fn test_obs_value_json_shape() {
        let json = r#"{"patient": 7, "concept": "856", "value": {"numeric": 1500}, "obs_datetime": "2024-01-01T00:00:00"}"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.value_numeric(), Some(Decimal::from(1500)));
        assert_eq!(obs.patient, PatientId(7));
    }
}
