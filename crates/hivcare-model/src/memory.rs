//! In-memory patient data source
//!
//! Stands in for the host EMR in tests and in the command-line tool. Data can
//! be assembled with the builder methods or loaded from a JSON document of the
//! form:
//!
//! ```json
//! {
//!   "patients": [{"id": 1, "sex": "F", "birthdate": "1990-04-01"}],
//!   "observations": [{"patient": 1, "concept": "856AAAA...", "value": {"numeric": 1500},
//!                     "obs_datetime": "2024-01-10T09:00:00"}],
//!   "enrollments": [{"patient": 1, "program": "dfdc6d40-...", "date_enrolled": "2020-01-01T00:00:00"}],
//!   "drug_orders": [{"patient": 1, "drug": "84795AAA...", "date_activated": "2020-02-01T00:00:00"}]
//! }
//! ```

use crate::cohort::{Cohort, PatientId};
use crate::patient::{ConceptCode, DrugOrder, Observation, Patient, ProgramEnrollment};
use crate::provider::{DataSourceError, PatientDataSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryPatientStore {
    patients: Vec<Patient>,
    observations: Vec<Observation>,
    enrollments: Vec<ProgramEnrollment>,
    drug_orders: Vec<DrugOrder>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a store from JSON and check that every record belongs to a known patient
    pub fn from_json(json: &str) -> Result<Self, DataSourceError> {
        let store: Self =
            serde_json::from_str(json).map_err(|e| DataSourceError::InvalidData(e.to_string()))?;
        store.validate()?;
        log::debug!(
            "Loaded {} patients, {} observations, {} enrollments, {} drug orders",
            store.patients.len(),
            store.observations.len(),
            store.enrollments.len(),
            store.drug_orders.len()
        );
        Ok(store)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DataSourceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DataSourceError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn with_patient(mut self, patient: Patient) -> Self {
        self.add_patient(patient);
        self
    }

    pub fn with_observation(mut self, obs: Observation) -> Self {
        self.add_observation(obs);
        self
    }

    pub fn with_enrollment(mut self, enrollment: ProgramEnrollment) -> Self {
        self.add_enrollment(enrollment);
        self
    }

    pub fn with_drug_order(mut self, order: DrugOrder) -> Self {
        self.add_drug_order(order);
        self
    }

    /// Add or replace a patient
    pub fn add_patient(&mut self, patient: Patient) {
        self.patients.retain(|p| p.id != patient.id);
        self.patients.push(patient);
    }

    pub fn add_observation(&mut self, obs: Observation) {
        self.observations.push(obs);
    }

    pub fn add_enrollment(&mut self, enrollment: ProgramEnrollment) {
        self.enrollments.push(enrollment);
    }

    pub fn add_drug_order(&mut self, order: DrugOrder) {
        self.drug_orders.push(order);
    }

    fn validate(&self) -> Result<(), DataSourceError> {
        let known: Cohort = self.patients.iter().map(|p| p.id).collect();
        if known.len() != self.patients.len() {
            return Err(DataSourceError::InvalidData("duplicate patient id".to_string()));
        }

        let referenced = self
            .observations
            .iter()
            .map(|o| o.patient)
            .chain(self.enrollments.iter().map(|e| e.patient))
            .chain(self.drug_orders.iter().map(|d| d.patient));
        for id in referenced {
            if !known.contains(id) {
                return Err(DataSourceError::InvalidData(format!(
                    "record refers to unknown patient {}",
                    id
                )));
            }
        }
        Ok(())
    }
}

/// Group records by patient, keeping only cohort members, each group sorted by `key`
fn group_sorted<T: Clone, K: Ord>(
    records: impl Iterator<Item = T>,
    cohort: &Cohort,
    patient: impl Fn(&T) -> PatientId,
    key: impl Fn(&T) -> K,
) -> HashMap<PatientId, Vec<T>> {
    let mut grouped: BTreeMap<PatientId, Vec<T>> = BTreeMap::new();
    for record in records {
        let id = patient(&record);
        if cohort.contains(id) {
            grouped.entry(id).or_default().push(record);
        }
    }
    grouped
        .into_iter()
        .map(|(id, mut list)| {
            // stable: equal timestamps keep insertion order
            list.sort_by(|a, b| key(a).cmp(&key(b)));
            (id, list)
        })
        .collect()
}

impl PatientDataSource for InMemoryPatientStore {
    fn all_patient_ids(&self) -> Result<Cohort, DataSourceError> {
        Ok(self.patients.iter().map(|p| p.id).collect())
    }

    fn patients(&self, cohort: &Cohort) -> Result<Vec<Patient>, DataSourceError> {
        let mut found: Vec<Patient> = self
            .patients
            .iter()
            .filter(|p| cohort.contains(p.id))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        Ok(found)
    }

    fn observations(
        &self,
        concept: &ConceptCode,
        cohort: &Cohort,
    ) -> Result<HashMap<PatientId, Vec<Observation>>, DataSourceError> {
        Ok(group_sorted(
            self.observations.iter().filter(|o| &o.concept == concept).cloned(),
            cohort,
            |o| o.patient,
            |o| o.obs_datetime,
        ))
    }

    fn enrollments(
        &self,
        program: &str,
        cohort: &Cohort,
    ) -> Result<HashMap<PatientId, Vec<ProgramEnrollment>>, DataSourceError> {
        Ok(group_sorted(
            self.enrollments.iter().filter(|e| e.program == program).cloned(),
            cohort,
            |e| e.patient,
            |e| e.date_enrolled,
        ))
    }

    fn drug_orders(&self, cohort: &Cohort) -> Result<HashMap<PatientId, Vec<DrugOrder>>, DataSourceError> {
        Ok(group_sorted(
            self.drug_orders.iter().cloned(),
            cohort,
            |d| d.patient,
            |d| d.date_activated,
        ))
    }
}
