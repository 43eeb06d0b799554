//! In-memory event tables
//!
//! Reference [`QueryExecutor`] over named tables of rows, loaded from JSON of
//! the form `{"tables": {"etl_hts_test": [{"patient_id": 1, ...}, ...]}}`.

use crate::context::ReportContext;
use crate::error::QueryError;
use crate::query::{CohortQuery, FieldValue, PATIENT_ID, Predicate, QueryExecutor, Row, date_cell};
use chrono::NaiveDate;
use hivcare_model::{Cohort, PatientId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryEventStore {
    #[serde(default)]
    tables: IndexMap<String, Vec<Row>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, QueryError> {
        let mut store: Self = serde_json::from_str(json).map_err(|e| QueryError::Execution(e.to_string()))?;
        store.flags_as_integers();
        log::debug!(
            "Loaded {} tables, {} rows",
            store.tables.len(),
            store.tables.values().map(Vec::len).sum::<usize>()
        );
        Ok(store)
    }

    /// ETL flag columns are 0/1 integers; JSON `true`/`false` cells load as 1/0
    fn flags_as_integers(&mut self) {
        for cell in self.tables.values_mut().flatten().flat_map(|row| row.values_mut()) {
            if let FieldValue::Bool(flag) = *cell {
                *cell = FieldValue::Int(i64::from(flag));
            }
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, QueryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Execution(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Create an empty table, keeping any rows already present
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.ensure_table(table);
        self
    }

    pub fn with_row(mut self, table: impl Into<String>, row: Row) -> Self {
        self.add_row(table, row);
        self
    }

    pub fn ensure_table(&mut self, table: impl Into<String>) {
        self.tables.entry(table.into()).or_default();
    }

    pub fn add_row(&mut self, table: impl Into<String>, row: Row) {
        self.tables.entry(table.into()).or_default().push(row);
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    fn table(&self, name: &str) -> Result<&[Row], QueryError> {
        self.tables
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| QueryError::unknown_table(name))
    }

    /// Rows of `table` matching `filter`, each with its patient
    fn matching<'s>(
        &'s self,
        table: &str,
        filter: &Predicate,
        ctx: &ReportContext,
    ) -> Result<Vec<(PatientId, &'s Row)>, QueryError> {
        let mut matched = Vec::new();
        for row in self.table(table)? {
            if filter.matches(table, row, ctx)? {
                matched.push((patient_of(table, row)?, row));
            }
        }
        Ok(matched)
    }

    fn latest_per_patient(
        &self,
        table: &str,
        filter: &Predicate,
        order_by: &str,
        then: &Predicate,
        ctx: &ReportContext,
    ) -> Result<Cohort, QueryError> {
        let mut latest: BTreeMap<PatientId, (NaiveDate, &Row)> = BTreeMap::new();
        for (patient, row) in self.matching(table, filter, ctx)? {
            let Some(date) = date_cell(table, order_by, row.get(order_by).unwrap_or(&FieldValue::Null))? else {
                continue;
            };
            // later rows win ties
            match latest.get(&patient) {
                Some((current, _)) if *current > date => {}
                _ => {
                    latest.insert(patient, (date, row));
                }
            }
        }

        let mut cohort = Cohort::new();
        for (patient, (_, row)) in latest {
            if then.matches(table, row, ctx)? {
                cohort.insert(patient);
            }
        }
        Ok(cohort)
    }
}

fn patient_of(table: &str, row: &Row) -> Result<PatientId, QueryError> {
    match row.get(PATIENT_ID) {
        Some(FieldValue::Int(id)) => u32::try_from(*id)
            .map(PatientId)
            .map_err(|_| QueryError::Execution(format!("{}: patient_id {} out of range", table, id))),
        Some(other) => Err(QueryError::type_mismatch(table, PATIENT_ID, "integer", other.type_name())),
        None => Err(QueryError::type_mismatch(table, PATIENT_ID, "integer", "null")),
    }
}

impl QueryExecutor for InMemoryEventStore {
    fn execute(&self, query: &CohortQuery, ctx: &ReportContext) -> Result<Cohort, QueryError> {
        match query {
            CohortQuery::Select { table, filter } => Ok(self
                .matching(table, filter, ctx)?
                .into_iter()
                .map(|(patient, _)| patient)
                .collect()),
            CohortQuery::LatestPerPatient {
                table,
                filter,
                order_by,
                then,
            } => self.latest_per_patient(table, filter, order_by, then, ctx),
            CohortQuery::ExcludeMatched { source, table, filter } => {
                let source = self.execute(source, ctx)?;
                let matched: Cohort = self
                    .matching(table, filter, ctx)?
                    .into_iter()
                    .map(|(patient, _)| patient)
                    .collect();
                Ok(source.difference(&matched))
            }
            CohortQuery::Intersect(queries) => {
                let mut result: Option<Cohort> = None;
                for query in queries {
                    let cohort = self.execute(query, ctx)?;
                    result = Some(match result {
                        Some(acc) => acc.intersection(&cohort),
                        None => cohort,
                    });
                }
                Ok(result.unwrap_or_default())
            }
            CohortQuery::Union(queries) => {
                let mut result = Cohort::new();
                for query in queries {
                    result = result.union(&self.execute(query, ctx)?);
                }
                Ok(result)
            }
            CohortQuery::Difference(left, right) => {
                let left = self.execute(left, ctx)?;
                Ok(left.difference(&self.execute(right, ctx)?))
            }
        }
    }
}
