//! Command-line Tests
//!
//! Tests for: calculate, flags, report and columns commands over data files

use chrono::{NaiveDate, NaiveDateTime};
use hivcare::HivCareError;
use hivcare::cli::calculate::{self, CalculateConfig};
use hivcare::cli::columns;
use hivcare::cli::flags::{self, FlagsConfig, RaisedFlag};
use hivcare::cli::output::OutputFormat;
use hivcare::cli::report::{self, ReportConfig};
use hivcare::diagnostics::{HC0100, HC0103, HC0104};
use hivcare::reporting::DatimQ4ReportBuilder;
use hivcare::MetadataCatalog;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::io::Write;
use tempfile::NamedTempFile;

// ============================================================================
// Test Helpers
// ============================================================================

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 8, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_json(value: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", value).unwrap();
    file
}

/// Patient 1 started ART 213 days before `now()` with no viral load on record;
/// patient 2 is in care but never started ART
fn patients_file() -> NamedTempFile {
    let catalog = MetadataCatalog::default();
    let arv = catalog.arv_drugs.iter().next().unwrap().as_str().to_string();
    write_json(&json!({
        "patients": [
            {"id": 1, "sex": "F", "birthdate": "1990-04-01"},
            {"id": 2, "sex": "M", "birthdate": "1985-01-01"}
        ],
        "enrollments": [
            {"patient": 1, "program": catalog.hiv_program, "date_enrolled": "2023-01-01T00:00:00"},
            {"patient": 2, "program": catalog.hiv_program, "date_enrolled": "2023-01-01T00:00:00"}
        ],
        "drug_orders": [
            {"patient": 1, "drug": arv, "date_activated": "2024-01-01T00:00:00"}
        ]
    }))
}

fn calculate_config(rule: &str, data: &NamedTempFile, output: &NamedTempFile) -> CalculateConfig {
    CalculateConfig {
        rule: rule.to_string(),
        data: data.path().to_path_buf(),
        now: now(),
        catalog: None,
        params: vec![],
        output_format: OutputFormat::Json,
        output_file: Some(output.path().to_path_buf()),
    }
}

fn hivcare_code(err: &anyhow::Error) -> Option<hivcare::diagnostics::ErrorCode> {
    err.chain()
        .find_map(|e| e.downcast_ref::<HivCareError>())
        .map(HivCareError::code)
}

// ============================================================================
// Calculate
// ============================================================================

#[test]
fn test_calculate_writes_results_per_patient() {
    let data = patients_file();
    let output = NamedTempFile::new().unwrap();

    calculate::calculate(calculate_config("on-art", &data, &output)).unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(output.path()).unwrap()).unwrap();
    assert_eq!(doc["calculation"], json!("on-art"));
    assert_eq!(doc["now"], json!("2024-08-01T00:00:00"));
    assert_eq!(doc["results"]["1"]["value"]["value"], json!(true));
    assert_eq!(doc["results"]["2"]["value"]["value"], json!(false));
}

#[test]
fn test_calculate_art_start_date() {
    let data = patients_file();
    let output = NamedTempFile::new().unwrap();

    calculate::calculate(calculate_config("initial-art-start-date", &data, &output)).unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(output.path()).unwrap()).unwrap();
    assert_eq!(doc["results"]["1"]["type"], json!("date"));
    assert_eq!(doc["results"]["2"]["type"], json!("null"));
}

#[test]
fn test_calculate_unknown_rule() {
    let data = patients_file();
    let output = NamedTempFile::new().unwrap();

    let err = calculate::calculate(calculate_config("no-such-rule", &data, &output)).unwrap_err();
    assert_eq!(hivcare_code(&err), Some(HC0103));
}

#[test]
fn test_calculate_rejects_bad_parameter() {
    let data = patients_file();
    let output = NamedTempFile::new().unwrap();
    let mut config = calculate_config("on-art", &data, &output);
    config.params = vec!["months".to_string()];

    assert!(calculate::calculate(config).is_err());
}

#[test]
fn test_calculate_missing_data_file() {
    let output = NamedTempFile::new().unwrap();
    let data = NamedTempFile::new().unwrap();
    let mut config = calculate_config("on-art", &data, &output);
    config.data = data.path().with_extension("missing");

    let err = calculate::calculate(config).unwrap_err();
    assert!(err.to_string().contains("Failed to load patient data"));
}

// ============================================================================
// Flags
// ============================================================================

#[test]
fn test_flags_lists_only_flagged_patients() {
    let data = patients_file();
    let config = FlagsConfig {
        data: data.path().to_path_buf(),
        now: now(),
        catalog: None,
        output_format: OutputFormat::Table,
        output_file: None,
    };

    let raised = flags::raised_flags(&config).unwrap();
    assert_eq!(
        raised,
        vec![RaisedFlag {
            patient: 1,
            flag: "needs-viral-load-test".to_string(),
            message: "Due for Viral Load".to_string(),
        }]
    );
}

#[test]
fn test_flags_with_custom_catalog() {
    let data = patients_file();
    // the ARV order no longer counts once the catalog lists other drugs
    let catalog = write_json(&json!({"arv_drugs": ["OTHER-ARV"]}));
    let config = FlagsConfig {
        data: data.path().to_path_buf(),
        now: now(),
        catalog: Some(catalog.path().to_path_buf()),
        output_format: OutputFormat::Json,
        output_file: None,
    };

    assert!(flags::raised_flags(&config).unwrap().is_empty());
}

#[test]
fn test_flags_with_invalid_catalog() {
    let data = patients_file();
    let catalog = write_json(&json!({"arv_drugs": []}));
    let config = FlagsConfig {
        data: data.path().to_path_buf(),
        now: now(),
        catalog: Some(catalog.path().to_path_buf()),
        output_format: OutputFormat::Json,
        output_file: None,
    };

    let err = flags::raised_flags(&config).unwrap_err();
    assert_eq!(hivcare_code(&err), Some(HC0100));

    let diagnostic = err
        .chain()
        .find_map(|e| e.downcast_ref::<HivCareError>())
        .unwrap()
        .to_diagnostic();
    assert!(diagnostic.help.unwrap().contains("--catalog"));
}

// ============================================================================
// Report
// ============================================================================

#[test]
fn test_report_over_partial_event_file() {
    let events = write_json(&json!({
        "tables": {
            "etl_patient_demographics": [
                {"patient_id": 1, "gender": "F", "dob": "1990-03-01"}
            ],
            "etl_drug_event": [
                {"patient_id": 1, "program": "HIV", "date_started": "2024-08-10", "voided": 0}
            ]
        }
    }));
    let config = ReportConfig::datim_q4(events.path().to_path_buf(), date(2024, 7, 1), date(2024, 9, 30));

    let data = report::run_report(&config).unwrap();
    assert_eq!(data.id, DatimQ4ReportBuilder::ID);
    assert_eq!(data.context.now, date(2024, 9, 30));

    let dataset = data.dataset(DatimQ4ReportBuilder::DATASET).unwrap();
    assert_eq!(dataset.get("TX_New_Sex_Age-15"), Some(1));
    assert_eq!(dataset.get("TX_New_Sex_Age-16"), Some(0));
}

#[test]
fn test_report_reversed_period() {
    let events = write_json(&json!({"tables": {}}));
    let config = ReportConfig::datim_q4(events.path().to_path_buf(), date(2024, 10, 1), date(2024, 9, 30));

    assert!(report::run_report(&config).is_err());
}

#[test]
fn test_report_unknown_id() {
    let events = write_json(&json!({"tables": {}}));
    let mut config = ReportConfig::datim_q4(events.path().to_path_buf(), date(2024, 7, 1), date(2024, 9, 30));
    config.report = "no.such.report".to_string();

    let err = report::run_report(&config).unwrap_err();
    assert_eq!(hivcare_code(&err), Some(HC0104));
}

// ============================================================================
// Columns
// ============================================================================

#[test]
fn test_columns_lists_datim_layout() {
    let columns = columns::report_columns(DatimQ4ReportBuilder::ID).unwrap();
    assert_eq!(columns.len(), 32 + 6 * 10 + 3 * 2 + 20 * 24);

    let first = &columns[0];
    assert_eq!(first.dataset, "3");
    assert_eq!(first.name, "TX_New_TB_co_infected");
    assert_eq!(first.indicator, "tx-new-tb-coinfected");
    assert_eq!(first.dimensions, "");

    let coded = columns.iter().find(|c| c.name == "TX_ML-24").unwrap();
    assert_eq!(coded.dimensions, "gender=M|age=50+");
}
