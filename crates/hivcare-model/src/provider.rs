//! Read-only patient data source

use crate::cohort::{Cohort, PatientId};
use crate::patient::{ConceptCode, DrugOrder, Observation, Patient, ProgramEnrollment};
use hivcare_diagnostics::{HC0300, HC0301, HivCareError};
use std::collections::HashMap;

/// Batch read access to the host's patient records
///
/// Every call covers a whole cohort at once. Implementations never mutate
/// what they return and hold no per-request state, so a single source can
/// serve concurrent evaluations.
pub trait PatientDataSource: Send + Sync {
    /// Every patient the source knows about
    fn all_patient_ids(&self) -> Result<Cohort, DataSourceError>;

    /// Demographics for the cohort members the source knows about
    fn patients(&self, cohort: &Cohort) -> Result<Vec<Patient>, DataSourceError>;

    /// Observations of a concept per patient, ascending by `obs_datetime`
    fn observations(
        &self,
        concept: &ConceptCode,
        cohort: &Cohort,
    ) -> Result<HashMap<PatientId, Vec<Observation>>, DataSourceError>;

    /// Enrollments in a program per patient, ascending by enrollment date
    fn enrollments(
        &self,
        program: &str,
        cohort: &Cohort,
    ) -> Result<HashMap<PatientId, Vec<ProgramEnrollment>>, DataSourceError>;

    /// Drug orders per patient, ascending by activation date
    fn drug_orders(&self, cohort: &Cohort) -> Result<HashMap<PatientId, Vec<DrugOrder>>, DataSourceError>;
}

/// Data source error
#[derive(Debug, Clone, thiserror::Error)]
pub enum DataSourceError {
    #[error("Patient data unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid patient data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<DataSourceError> for HivCareError {
    fn from(err: DataSourceError) -> Self {
        let code = match err {
            DataSourceError::InvalidData(_) => HC0301,
            DataSourceError::Unavailable(_) | DataSourceError::Io(_) => HC0300,
        };
        HivCareError::data(code, err.to_string())
    }
}

/// Data source with no patients, for tests
pub struct NoOpPatientDataSource;

impl NoOpPatientDataSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpPatientDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientDataSource for NoOpPatientDataSource {
    fn all_patient_ids(&self) -> Result<Cohort, DataSourceError> {
        Ok(Cohort::new())
    }

    fn patients(&self, _cohort: &Cohort) -> Result<Vec<Patient>, DataSourceError> {
        Ok(vec![])
    }

    fn observations(
        &self,
        _concept: &ConceptCode,
        _cohort: &Cohort,
    ) -> Result<HashMap<PatientId, Vec<Observation>>, DataSourceError> {
        Ok(HashMap::new())
    }

    fn enrollments(
        &self,
        _program: &str,
        _cohort: &Cohort,
    ) -> Result<HashMap<PatientId, Vec<ProgramEnrollment>>, DataSourceError> {
        Ok(HashMap::new())
    }

    fn drug_orders(&self, _cohort: &Cohort) -> Result<HashMap<PatientId, Vec<DrugOrder>>, DataSourceError> {
        Ok(HashMap::new())
    }
}
