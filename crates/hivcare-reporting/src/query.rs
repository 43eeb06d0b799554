//! Declarative cohort queries
//!
//! Indicators describe the patients they count as a tree of [`CohortQuery`]
//! nodes over named tables of rows, filtered by [`Predicate`]s. Nothing here
//! is tied to a query dialect; a [`QueryExecutor`] decides how to run it.
//!
//! # Semantics
//!
//! - Every table has an integer `patient_id` column.
//! - A column missing from a row reads as `Null`.
//! - Comparisons against `Null` never match, as in SQL.
//! - Date windows are inclusive at both ends.
//! - Date and age predicates on a column holding a non-date value are a
//!   malformed query and fail with [`QueryError::TypeMismatch`].

use crate::context::ReportContext;
use crate::error::{QueryError, ReportError};
use chrono::{Datelike, Months, NaiveDate};
use hivcare_model::Cohort;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Column holding the patient identifier in every table
pub const PATIENT_ID: &str = "patient_id";

/// One row of a table
pub type Row = IndexMap<String, FieldValue>;

/// Cell value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Date(_) => "date",
            Self::Text(_) => "text",
        }
    }

    /// Ordering between values of the same kind; `None` across kinds or with `Null`
    fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Build a row from column/value pairs
pub fn row<const N: usize>(fields: [(&str, FieldValue); N]) -> Row {
    fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Where a date bound takes its date from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateAnchor {
    /// A date parameter of the context, such as `endDate`
    Parameter(String),
    /// The context's reference date
    Reference,
}

/// A date resolved against the context, optionally shifted back by calendar months
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBound {
    pub anchor: DateAnchor,
    #[serde(default)]
    pub months_before: u32,
}

impl DateBound {
    pub fn parameter(name: impl Into<String>) -> Self {
        Self {
            anchor: DateAnchor::Parameter(name.into()),
            months_before: 0,
        }
    }

    pub fn reference() -> Self {
        Self {
            anchor: DateAnchor::Reference,
            months_before: 0,
        }
    }

    /// Shift the bound back by whole calendar months, clamping to month end
    pub fn months_before(mut self, months: u32) -> Self {
        self.months_before = months;
        self
    }

    pub fn resolve(&self, ctx: &ReportContext) -> Result<NaiveDate, QueryError> {
        let base = match &self.anchor {
            DateAnchor::Reference => ctx.now,
            DateAnchor::Parameter(name) => ctx.date_parameter(name).map_err(|e| match e {
                ReportError::MissingParameter { name } => QueryError::MissingParameter { name },
                other => QueryError::Execution(other.to_string()),
            })?,
        };
        base.checked_sub_months(Months::new(self.months_before))
            .ok_or_else(|| QueryError::Execution(format!("date out of range: {} - {} months", base, self.months_before)))
    }
}

/// Unit for age predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeUnit {
    Years,
    Months,
}

impl AgeUnit {
    /// Completed units between `birth` and `on`, `None` if born after `on`
    pub fn age(&self, birth: NaiveDate, on: NaiveDate) -> Option<u32> {
        if birth > on {
            return None;
        }
        let before_anniversary = (on.month(), on.day()) < (birth.month(), birth.day());
        let age = match self {
            AgeUnit::Years => on.year() - birth.year() - i32::from(before_anniversary),
            AgeUnit::Months => {
                let months = (on.year() - birth.year()) * 12 + on.month() as i32 - birth.month() as i32;
                months - i32::from(on.day() < birth.day())
            }
        };
        u32::try_from(age).ok()
    }
}

/// Row filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Eq(String, FieldValue),
    NotEq(String, FieldValue),
    In(String, Vec<FieldValue>),
    /// Column strictly below the value; values of another kind never match
    LessThan(String, FieldValue),
    IsNull(String),
    NotNull(String),
    /// Date column within `[from, to]`; a missing bound is open
    DateBetween {
        column: String,
        from: Option<DateBound>,
        to: Option<DateBound>,
    },
    /// Date column strictly before the bound
    DateBefore { column: String, bound: DateBound },
    /// Age in whole units within `[min, max]` on the given date
    AgeBetween {
        birthdate_column: String,
        min: u32,
        max: Option<u32>,
        unit: AgeUnit,
        on: DateBound,
    },
    /// All must match; an empty list matches every row
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Matches every row
    pub fn all() -> Self {
        Self::And(Vec::new())
    }

    pub fn eq(column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    pub fn not_eq(column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::NotEq(column.into(), value.into())
    }

    pub fn is_in<V: Into<FieldValue>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn less_than(column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::LessThan(column.into(), value.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Self::NotNull(column.into())
    }

    pub fn date_between(column: impl Into<String>, from: Option<DateBound>, to: Option<DateBound>) -> Self {
        Self::DateBetween {
            column: column.into(),
            from,
            to,
        }
    }

    pub fn date_before(column: impl Into<String>, bound: DateBound) -> Self {
        Self::DateBefore {
            column: column.into(),
            bound,
        }
    }

    pub fn age_between(
        birthdate_column: impl Into<String>,
        min: u32,
        max: Option<u32>,
        unit: AgeUnit,
        on: DateBound,
    ) -> Self {
        Self::AgeBetween {
            birthdate_column: birthdate_column.into(),
            min,
            max,
            unit,
            on,
        }
    }

    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self::And(predicates)
    }

    pub fn or(predicates: Vec<Predicate>) -> Self {
        Self::Or(predicates)
    }

    pub fn negate(predicate: Predicate) -> Self {
        Self::Not(Box::new(predicate))
    }

    /// Evaluate against one row of `table`
    pub fn matches(&self, table: &str, row: &Row, ctx: &ReportContext) -> Result<bool, QueryError> {
        let cell = |column: &str| row.get(column).unwrap_or(&FieldValue::Null);

        match self {
            Predicate::Eq(column, value) => Ok(!value.is_null() && cell(column) == value),
            Predicate::NotEq(column, value) => {
                let actual = cell(column);
                Ok(!actual.is_null() && !value.is_null() && actual != value)
            }
            Predicate::In(column, values) => {
                let actual = cell(column);
                Ok(!actual.is_null() && values.contains(actual))
            }
            Predicate::LessThan(column, value) => Ok(cell(column).compare(value) == Some(Ordering::Less)),
            Predicate::IsNull(column) => Ok(cell(column).is_null()),
            Predicate::NotNull(column) => Ok(!cell(column).is_null()),
            Predicate::DateBetween { column, from, to } => {
                let Some(date) = date_cell(table, column, cell(column))? else {
                    return Ok(false);
                };
                if let Some(from) = from {
                    if date < from.resolve(ctx)? {
                        return Ok(false);
                    }
                }
                if let Some(to) = to {
                    if date > to.resolve(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::DateBefore { column, bound } => match date_cell(table, column, cell(column))? {
                Some(date) => Ok(date < bound.resolve(ctx)?),
                None => Ok(false),
            },
            Predicate::AgeBetween {
                birthdate_column,
                min,
                max,
                unit,
                on,
            } => {
                let Some(birth) = date_cell(table, birthdate_column, cell(birthdate_column))? else {
                    return Ok(false);
                };
                let Some(age) = unit.age(birth, on.resolve(ctx)?) else {
                    return Ok(false);
                };
                Ok(age >= *min && max.is_none_or(|max| age <= max))
            }
            Predicate::And(predicates) => {
                for predicate in predicates {
                    if !predicate.matches(table, row, ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(predicates) => {
                for predicate in predicates {
                    if predicate.matches(table, row, ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not(predicate) => Ok(!predicate.matches(table, row, ctx)?),
        }
    }
}

/// Read a cell that must hold a date or `Null`
pub(crate) fn date_cell(table: &str, column: &str, value: &FieldValue) -> Result<Option<NaiveDate>, QueryError> {
    match value {
        FieldValue::Date(date) => Ok(Some(*date)),
        FieldValue::Null => Ok(None),
        other => Err(QueryError::type_mismatch(table, column, "date", other.type_name())),
    }
}

/// Set-membership query returning a cohort of patients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortQuery {
    /// Patients with at least one row of `table` matching `filter`
    Select { table: String, filter: Predicate },
    /// Patients whose most recent row matching `filter`, by the `order_by`
    /// date, also satisfies `then`
    LatestPerPatient {
        table: String,
        filter: Predicate,
        order_by: String,
        then: Predicate,
    },
    /// Patients of `source` with no row of `table` matching `filter`
    ExcludeMatched {
        source: Box<CohortQuery>,
        table: String,
        filter: Predicate,
    },
    /// Patients in every query; empty when there are none
    Intersect(Vec<CohortQuery>),
    Union(Vec<CohortQuery>),
    Difference(Box<CohortQuery>, Box<CohortQuery>),
}

impl CohortQuery {
    pub fn select(table: impl Into<String>, filter: Predicate) -> Self {
        Self::Select {
            table: table.into(),
            filter,
        }
    }

    pub fn latest_per_patient(
        table: impl Into<String>,
        filter: Predicate,
        order_by: impl Into<String>,
        then: Predicate,
    ) -> Self {
        Self::LatestPerPatient {
            table: table.into(),
            filter,
            order_by: order_by.into(),
            then,
        }
    }

    pub fn exclude_matched(source: CohortQuery, table: impl Into<String>, filter: Predicate) -> Self {
        Self::ExcludeMatched {
            source: Box::new(source),
            table: table.into(),
            filter,
        }
    }

    pub fn intersect(queries: Vec<CohortQuery>) -> Self {
        Self::Intersect(queries)
    }

    pub fn union(queries: Vec<CohortQuery>) -> Self {
        Self::Union(queries)
    }

    pub fn difference(left: CohortQuery, right: CohortQuery) -> Self {
        Self::Difference(Box::new(left), Box::new(right))
    }
}

/// Runs cohort queries against a backing store
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, query: &CohortQuery, ctx: &ReportContext) -> Result<Cohort, QueryError>;
}
