//! Input loading shared by the commands

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use hivcare_diagnostics::HivCareError;
use hivcare_model::{InMemoryPatientStore, MetadataCatalog};
use hivcare_reporting::{ETL_TABLES, InMemoryEventStore};
use serde_json::{Value, json};
use std::path::Path;

/// Load a patient data file
pub fn load_patients(path: &Path) -> Result<InMemoryPatientStore> {
    let store = InMemoryPatientStore::from_json_file(path)
        .map_err(HivCareError::from)
        .with_context(|| format!("Failed to load patient data: {}", path.display()))?;
    log::info!("Loaded patient data from {}", path.display());
    Ok(store)
}

/// Load the metadata catalog, or the default catalog when no file is given
pub fn load_catalog(path: Option<&Path>) -> Result<MetadataCatalog> {
    let Some(path) = path else {
        return Ok(MetadataCatalog::default());
    };
    let catalog = MetadataCatalog::from_json_file(path)
        .map_err(|e| HivCareError::from(e).with_context("omit --catalog to use the built-in codes"))
        .with_context(|| format!("Failed to load catalog: {}", path.display()))?;
    log::info!("Loaded metadata catalog from {}", path.display());
    Ok(catalog)
}

/// Load an ETL event file; every report table exists afterwards, empty if the file left it out
pub fn load_events(path: &Path) -> Result<InMemoryEventStore> {
    let mut store = InMemoryEventStore::from_json_file(path)
        .map_err(HivCareError::from)
        .with_context(|| format!("Failed to load event data: {}", path.display()))?;
    for table in ETL_TABLES {
        store.ensure_table(table);
    }
    log::info!(
        "Loaded event data from {} ({} tables)",
        path.display(),
        store.table_names().count()
    );
    Ok(store)
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`; a bare date means midnight
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(datetime);
    }
    parse_date(s).map(|date| date.and_time(chrono::NaiveTime::MIN))
}

/// Parse `YYYY-MM-DD`
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("'{}' is not a date: {}", s, e))
}

/// Parse parameter strings (name=value), keeping their order
pub fn parse_parameters(params: &[String]) -> Result<Vec<(String, Value)>> {
    let mut result = Vec::with_capacity(params.len());

    for param in params {
        let Some((name, value_str)) = param.split_once('=') else {
            anyhow::bail!("Invalid parameter format: '{}'. Expected 'name=value'", param);
        };
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Invalid parameter format: '{}'. Missing name", param);
        }
        let value_str = value_str.trim();

        let value = if let Ok(num) = value_str.parse::<i64>() {
            json!(num)
        } else if let Ok(num) = value_str.parse::<f64>() {
            json!(num)
        } else if value_str == "true" || value_str == "false" {
            json!(value_str == "true")
        } else if value_str == "null" {
            Value::Null
        } else if value_str.starts_with('{') || value_str.starts_with('[') {
            serde_json::from_str(value_str).unwrap_or_else(|_| json!(value_str))
        } else {
            json!(value_str)
        };

        result.push((name.to_string(), value));
    }

    Ok(result)
}
