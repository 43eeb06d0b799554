//! Report command implementation

use super::{input, output};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use hivcare_diagnostics::HivCareError;
use hivcare_reporting::evaluator::{END_DATE, START_DATE};
use hivcare_reporting::{DatimQ4ReportBuilder, ReportContext, ReportData, ReportRegistry, ReportRunner};
use std::path::PathBuf;
use tabled::Tabled;

/// Configuration for report command
pub struct ReportConfig {
    pub report: String,
    pub data: PathBuf,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Reference date; the end of the period when absent
    pub now: Option<NaiveDate>,
    pub output_format: output::OutputFormat,
    pub output_file: Option<PathBuf>,
}

impl ReportConfig {
    /// DATIM Q4 over the given period
    pub fn datim_q4(data: PathBuf, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            report: DatimQ4ReportBuilder::ID.to_string(),
            data,
            start,
            end,
            now: None,
            output_format: output::OutputFormat::default(),
            output_file: None,
        }
    }
}

#[derive(Debug, Tabled)]
struct CountRow {
    #[tabled(rename = "Dataset")]
    dataset: String,
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Count")]
    count: usize,
}

/// Run a report and print its counts
pub fn report(config: ReportConfig) -> Result<()> {
    let data = run_report(&config)?;

    let rows: Vec<CountRow> = data
        .datasets
        .iter()
        .flat_map(|dataset| {
            dataset.values.iter().map(move |value| CountRow {
                dataset: dataset.name.clone(),
                column: value.column.clone(),
                label: value.label.clone(),
                count: value.count,
            })
        })
        .collect();

    output::print_output(&data, &rows, config.output_format, config.output_file.as_deref())
}

/// Run a registered report against an ETL event file
pub fn run_report(config: &ReportConfig) -> Result<ReportData> {
    let registry = ReportRegistry::with_standard_reports();
    let builder = registry.require(&config.report).map_err(HivCareError::from)?;
    let definition = builder
        .build()
        .map_err(HivCareError::from)
        .with_context(|| format!("Failed to build report '{}'", config.report))?;

    let store = input::load_events(&config.data)?;
    let ctx = ReportContext::new(config.now.unwrap_or(config.end))
        .with_parameter(START_DATE, config.start)
        .with_parameter(END_DATE, config.end);

    let data = ReportRunner::new(&store)
        .run(&definition, &ctx)
        .map_err(HivCareError::from)
        .with_context(|| format!("Failed to run report '{}'", definition.name))?;
    log::info!(
        "Report '{}' finished with {} columns",
        data.id,
        data.datasets.iter().map(|d| d.len()).sum::<usize>()
    );
    Ok(data)
}
