//! Query and report errors

use hivcare_diagnostics::{
    HC0101, HC0102, HC0104, HC0400, HC0401, HC0402, HC0403, HC0404, HC0405, HC0406, HivCareError,
};
use thiserror::Error;

/// Errors raised while executing a declarative cohort query
///
/// Any of these means the query itself is malformed for the data it runs
/// against. Missing rows or `Null` cells are never errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    #[error("Unknown table: {table}")]
    UnknownTable { table: String },

    #[error("Column '{column}' in table '{table}' holds {found}, expected {expected}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Query refers to missing parameter: {name}")]
    MissingParameter { name: String },

    #[error("Query execution failed: {0}")]
    Execution(String),
}

impl QueryError {
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable { table: table.into() }
    }

    pub fn type_mismatch(
        table: impl Into<String>,
        column: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            table: table.into(),
            column: column.into(),
            expected,
            found,
        }
    }
}

/// Errors raised while building or running a report
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReportError {
    #[error("Missing parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Invalid parameter mapping '{mapping}': {message}")]
    InvalidMapping { mapping: String, message: String },

    #[error("Unknown dimension: {name}")]
    UnknownDimension { name: String },

    #[error("Dimension '{dimension}' has no option '{option}'")]
    UnknownDimensionOption { dimension: String, option: String },

    #[error("Duplicate column: {name}")]
    DuplicateColumn { name: String },

    #[error("Invalid definition '{name}': {message}")]
    InvalidDefinition { name: String, message: String },

    #[error("Unknown report: {id}")]
    UnknownReport { id: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Dimension '{dimension}={option}' failed: {source}")]
    Dimension {
        dimension: String,
        option: String,
        #[source]
        source: Box<ReportError>,
    },

    #[error("Indicator '{indicator}' failed: {source}")]
    Indicator {
        indicator: String,
        #[source]
        source: Box<ReportError>,
    },
}

impl ReportError {
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_mapping(mapping: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMapping {
            mapping: mapping.into(),
            message: message.into(),
        }
    }

    pub fn invalid_definition(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn indicator(indicator: impl Into<String>, source: ReportError) -> Self {
        Self::Indicator {
            indicator: indicator.into(),
            source: Box::new(source),
        }
    }

    pub fn dimension(dimension: impl Into<String>, option: impl Into<String>, source: ReportError) -> Self {
        Self::Dimension {
            dimension: dimension.into(),
            option: option.into(),
            source: Box::new(source),
        }
    }
}

impl From<QueryError> for HivCareError {
    fn from(err: QueryError) -> Self {
        let code = match err {
            QueryError::UnknownTable { .. } => HC0401,
            QueryError::TypeMismatch { .. } => HC0402,
            QueryError::MissingParameter { .. } => HC0101,
            QueryError::Execution(_) => HC0400,
        };
        HivCareError::report(code, err.to_string())
    }
}

impl From<ReportError> for HivCareError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::MissingParameter { .. } => HivCareError::configuration(HC0101, err.to_string()),
            ReportError::InvalidParameter { .. } => HivCareError::configuration(HC0102, err.to_string()),
            ReportError::UnknownReport { .. } => HivCareError::configuration(HC0104, err.to_string()),
            ReportError::InvalidMapping { .. } => HivCareError::report(HC0405, err.to_string()),
            ReportError::UnknownDimension { .. } | ReportError::UnknownDimensionOption { .. } => {
                HivCareError::report(HC0404, err.to_string())
            }
            ReportError::DuplicateColumn { .. } | ReportError::InvalidDefinition { .. } => {
                HivCareError::report(HC0406, err.to_string())
            }
            ReportError::Query(query) => query.into(),
            ReportError::Dimension { .. } => HivCareError::report(HC0403, err.to_string()),
            ReportError::Indicator { ref indicator, .. } => {
                let indicator = indicator.clone();
                HivCareError::report(HC0403, err.to_string()).for_indicator(indicator)
            }
        }
    }
}
