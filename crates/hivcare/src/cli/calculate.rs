//! Calculate command implementation

use super::{input, output};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use hivcare_calc::{CalculationContext, CalculationRegistry, CalculationResultMap};
use hivcare_diagnostics::HivCareError;
use hivcare_model::PatientDataSource;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

/// Configuration for calculate command
pub struct CalculateConfig {
    pub rule: String,
    pub data: PathBuf,
    pub now: NaiveDateTime,
    pub catalog: Option<PathBuf>,
    pub params: Vec<String>,
    pub output_format: output::OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// JSON document for one calculation run
#[derive(Debug, Serialize)]
pub struct CalculationOutput<'a> {
    pub calculation: &'a str,
    pub now: NaiveDateTime,
    pub results: &'a CalculationResultMap,
}

#[derive(Debug, Tabled)]
struct ResultRow {
    #[tabled(rename = "Patient")]
    patient: String,
    #[tabled(rename = "Result")]
    result: String,
}

/// Evaluate one registered rule for every patient in the data file
pub fn calculate(config: CalculateConfig) -> Result<()> {
    let registry = CalculationRegistry::with_standard_library();
    let calculation = registry.require(&config.rule).map_err(HivCareError::from)?;

    let store = input::load_patients(&config.data)?;
    let catalog = input::load_catalog(config.catalog.as_deref())?;
    let params = input::parse_parameters(&config.params)?;

    let ctx = params
        .into_iter()
        .fold(CalculationContext::new(config.now, &catalog, &store), |ctx, (name, value)| {
            ctx.with_parameter(name, value)
        });

    let cohort = store.all_patient_ids().map_err(HivCareError::from)?;
    log::info!("Evaluating '{}' for {} patients at {}", calculation.name(), cohort.len(), config.now);

    let results = calculation
        .evaluate(&cohort, &ctx)
        .map_err(|e| HivCareError::from(e).for_calculation(calculation.name()))
        .with_context(|| format!("Calculation '{}' failed", calculation.name()))?;

    let rows: Vec<ResultRow> = results
        .iter()
        .map(|(patient, result)| ResultRow {
            patient: patient.to_string(),
            result: result.to_string(),
        })
        .collect();
    let document = CalculationOutput {
        calculation: calculation.name(),
        now: config.now,
        results: &results,
    };

    output::print_output(&document, &rows, config.output_format, config.output_file.as_deref())
}
