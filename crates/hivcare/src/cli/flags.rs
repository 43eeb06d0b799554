//! Flags command implementation

use super::{input, output};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use hivcare_calc::{CalculationContext, CalculationRegistry};
use hivcare_diagnostics::HivCareError;
use hivcare_model::PatientDataSource;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

/// Configuration for flags command
pub struct FlagsConfig {
    pub data: PathBuf,
    pub now: NaiveDateTime,
    pub catalog: Option<PathBuf>,
    pub output_format: output::OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// One raised flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct RaisedFlag {
    #[tabled(rename = "Patient")]
    pub patient: u32,
    #[tabled(rename = "Flag")]
    pub flag: String,
    #[tabled(rename = "Message")]
    pub message: String,
}

/// Evaluate every flag rule and list the patients it raises for
pub fn flags(config: FlagsConfig) -> Result<()> {
    let raised = raised_flags(&config)?;
    log::info!("{} flags raised", raised.len());
    output::print_output(&raised, &raised, config.output_format, config.output_file.as_deref())
}

/// Flags raised for the data file, ordered by patient and then by rule
pub fn raised_flags(config: &FlagsConfig) -> Result<Vec<RaisedFlag>> {
    let registry = CalculationRegistry::with_standard_library();
    let store = input::load_patients(&config.data)?;
    let catalog = input::load_catalog(config.catalog.as_deref())?;
    let ctx = CalculationContext::new(config.now, &catalog, &store);
    let cohort = store.all_patient_ids().map_err(HivCareError::from)?;

    let mut raised = Vec::new();
    for flag in registry.flags() {
        let results = flag
            .evaluate(&cohort, &ctx)
            .map_err(|e| HivCareError::from(e).for_calculation(flag.name()))
            .with_context(|| format!("Flag '{}' failed", flag.name()))?;

        for (patient, result) in results.iter() {
            if result.as_bool() != Some(true) {
                continue;
            }
            raised.push(RaisedFlag {
                patient: patient.0,
                flag: flag.name().to_string(),
                message: result.message().unwrap_or(flag.flag_message()).to_string(),
            });
        }
    }

    raised.sort_by_key(|f| f.patient);
    Ok(raised)
}
