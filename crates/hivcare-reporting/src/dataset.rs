//! Cohort indicator datasets
//!
//! A [`CohortIndicatorDataSetDefinition`] is an ordered list of columns. Each
//! column counts the patients of one indicator cohort, optionally narrowed
//! by dimension options (`"gender=F|age=10-14"`). Evaluation produces a
//! [`DataSet`] of counts in column order.

use crate::cohort::CohortDefinition;
use crate::dimension::Dimension;
use crate::error::ReportError;
use crate::mapped::Mapped;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Date,
    Text,
}

/// A declared parameter of a report, dataset or cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub label: String,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
        }
    }

    pub fn date(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, ParameterKind::Date)
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, ParameterKind::Text)
    }
}

/// Counts the members of a mapped cohort
#[derive(Debug, Clone)]
pub struct CohortIndicator {
    pub name: String,
    pub cohort: Mapped<dyn CohortDefinition>,
}

impl CohortIndicator {
    pub fn new(name: impl Into<String>, cohort: Mapped<dyn CohortDefinition>) -> Self {
        Self {
            name: name.into(),
            cohort,
        }
    }
}

/// Parse `"gender=F|age=10-14"` into ordered dimension/option pairs
pub fn parse_dimension_options(options: &str) -> Result<Vec<(String, String)>, ReportError> {
    let mut pairs = Vec::new();
    for part in options.split('|').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('=') {
            Some((dimension, option)) if !dimension.trim().is_empty() && !option.trim().is_empty() => {
                pairs.push((dimension.trim().to_string(), option.trim().to_string()));
            }
            _ => {
                return Err(ReportError::invalid_definition(
                    options,
                    format!("'{}' is not dimension=option", part),
                ));
            }
        }
    }
    Ok(pairs)
}

/// Label and dimension options of one column in a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnParameters {
    pub label: String,
    pub dimensions: String,
}

impl ColumnParameters {
    pub fn new(label: impl Into<String>, dimensions: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            dimensions: dimensions.into(),
        }
    }

    /// Column without dimension options
    pub fn total() -> Self {
        Self::new("Total", "")
    }
}

/// One output column
#[derive(Debug, Clone)]
pub struct DataSetColumn {
    pub name: String,
    pub label: String,
    pub indicator: Mapped<CohortIndicator>,
    pub dimension_options: Vec<(String, String)>,
}

impl DataSetColumn {
    /// Dimension options in `gender=F|age=<1` form, empty for totals
    pub fn dimensions_label(&self) -> String {
        self.dimension_options
            .iter()
            .map(|(dimension, option)| format!("{}={}", dimension, option))
            .collect::<Vec<_>>()
            .join("|")
    }
}

#[derive(Debug, Default)]
pub struct CohortIndicatorDataSetDefinition {
    name: String,
    description: String,
    parameters: Vec<Parameter>,
    dimensions: IndexMap<String, Mapped<Dimension>>,
    columns: IndexMap<String, DataSetColumn>,
}

impl CohortIndicatorDataSetDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    pub fn add_dimension(&mut self, name: impl Into<String>, dimension: Mapped<Dimension>) {
        self.dimensions.insert(name.into(), dimension);
    }

    /// Add a column counting `indicator`, narrowed by `dimension_options`
    ///
    /// Every dimension and option named must already be declared.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        indicator: Mapped<CohortIndicator>,
        dimension_options: &str,
    ) -> Result<(), ReportError> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(ReportError::DuplicateColumn { name });
        }

        let dimension_options = parse_dimension_options(dimension_options)?;
        for (dimension, option) in &dimension_options {
            let Some(mapped) = self.dimensions.get(dimension) else {
                return Err(ReportError::UnknownDimension {
                    name: dimension.clone(),
                });
            };
            if mapped.definition.option(option).is_none() {
                return Err(ReportError::UnknownDimensionOption {
                    dimension: dimension.clone(),
                    option: option.clone(),
                });
            }
        }

        self.columns.insert(
            name.clone(),
            DataSetColumn {
                name,
                label: label.into(),
                indicator,
                dimension_options,
            },
        );
        Ok(())
    }

    /// Add one column per entry of `columns`, named `"{key}-{code}"` and
    /// labelled `"{label} ({column label})"`
    pub fn add_row<C: AsRef<str>>(
        &mut self,
        key: &str,
        label: &str,
        indicator: Mapped<CohortIndicator>,
        columns: &[ColumnParameters],
        codes: &[C],
    ) -> Result<(), ReportError> {
        if columns.len() != codes.len() {
            return Err(ReportError::invalid_definition(
                key,
                format!("{} columns but {} codes", columns.len(), codes.len()),
            ));
        }
        for (column, code) in columns.iter().zip(codes) {
            self.add_column(
                format!("{}-{}", key, code.as_ref()),
                format!("{} ({})", label, column.label),
                indicator.clone(),
                &column.dimensions,
            )?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn dimension(&self, name: &str) -> Option<&Mapped<Dimension>> {
        self.dimensions.get(name)
    }

    pub fn column(&self, name: &str) -> Option<&DataSetColumn> {
        self.columns.get(name)
    }

    /// Columns in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &DataSetColumn> {
        self.columns.values()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Count for one column of an evaluated dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSetValue {
    pub column: String,
    pub label: String,
    pub count: usize,
}

/// Evaluated dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSet {
    pub name: String,
    pub values: Vec<DataSetValue>,
}

impl DataSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, label: impl Into<String>, count: usize) {
        self.values.push(DataSetValue {
            column: column.into(),
            label: label.into(),
            count,
        });
    }

    pub fn get(&self, column: &str) -> Option<usize> {
        self.values.iter().find(|v| v.column == column).map(|v| v.count)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.column.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset {}", self.name)?;
        for value in &self.values {
            writeln!(f, "  {}: {}", value.column, value.count)?;
        }
        Ok(())
    }
}
