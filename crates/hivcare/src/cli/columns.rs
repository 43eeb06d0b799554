//! Columns command implementation

use super::output;
use anyhow::{Context, Result};
use hivcare_diagnostics::HivCareError;
use hivcare_reporting::ReportRegistry;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

/// Configuration for columns command
pub struct ColumnsConfig {
    pub report: String,
    pub output_format: output::OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// One column of a report dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct ColumnInfo {
    #[tabled(rename = "Dataset")]
    pub dataset: String,
    #[tabled(rename = "Column")]
    pub name: String,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Indicator")]
    pub indicator: String,
    #[tabled(rename = "Dimensions")]
    pub dimensions: String,
}

/// List every column of a registered report
pub fn columns(config: ColumnsConfig) -> Result<()> {
    let columns = report_columns(&config.report)?;
    output::print_output(&columns, &columns, config.output_format, config.output_file.as_deref())
}

/// Columns of a registered report, in dataset order
pub fn report_columns(report: &str) -> Result<Vec<ColumnInfo>> {
    let registry = ReportRegistry::with_standard_reports();
    let definition = registry
        .require(report)
        .and_then(|builder| builder.build())
        .map_err(HivCareError::from)
        .with_context(|| format!("Failed to build report '{}'", report))?;

    Ok(definition
        .datasets
        .iter()
        .flat_map(|mapped| {
            let dataset = mapped.definition.name().to_string();
            mapped.definition.columns().map(move |column| ColumnInfo {
                dataset: dataset.clone(),
                name: column.name.clone(),
                label: column.label.clone(),
                indicator: column.indicator.definition.name.clone(),
                dimensions: column.dimensions_label(),
            })
        })
        .collect())
}
