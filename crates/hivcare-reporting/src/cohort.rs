//! Cohort definitions and their evaluation

use crate::context::ReportContext;
use crate::dataset::Parameter;
use crate::error::ReportError;
use crate::query::{CohortQuery, DateBound, Predicate, QueryExecutor};
use hivcare_model::Cohort;
use serde::Serialize;

/// A named set of patients described as a declarative query
pub trait CohortDefinition: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Parameters the query expects in its context
    fn parameters(&self) -> &[Parameter] {
        &[]
    }

    /// The query selecting this cohort
    fn query(&self, ctx: &ReportContext) -> CohortQuery;
}

/// Cohort definition with a fixed query
#[derive(Debug, Clone)]
pub struct QueryCohortDefinition {
    name: String,
    description: String,
    parameters: Vec<Parameter>,
    query: CohortQuery,
}

impl QueryCohortDefinition {
    pub fn new(name: impl Into<String>, query: CohortQuery) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            query,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

impl CohortDefinition for QueryCohortDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn query(&self, _ctx: &ReportContext) -> CohortQuery {
        self.query.clone()
    }
}

/// Patients who tested HIV positive in the last 12 months and were not
/// successfully linked to care
///
/// Only each patient's most recent confirmatory test in the window counts.
/// A patient with no linkage record at all is included.
#[derive(Debug, Clone)]
pub struct HtsTestedPositiveNotLinkedCohortDefinition {
    linked_status: String,
}

impl HtsTestedPositiveNotLinkedCohortDefinition {
    pub const NAME: &'static str = "hts-tested-positive-not-linked";
    pub const TEST_TABLE: &'static str = "etl_hts_test";
    pub const LINKAGE_TABLE: &'static str = "etl_hts_referral_and_linkage";
    /// Confirmatory test
    pub const CONFIRMATORY_TEST: i64 = 2;
    pub const WINDOW_MONTHS: u32 = 12;

    pub fn new() -> Self {
        Self {
            linked_status: "Linked".to_string(),
        }
    }

    /// Tracing status that counts as successfully linked
    pub fn with_linked_status(mut self, status: impl Into<String>) -> Self {
        self.linked_status = status.into();
        self
    }

    pub fn linked_status(&self) -> &str {
        &self.linked_status
    }
}

impl Default for HtsTestedPositiveNotLinkedCohortDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl CohortDefinition for HtsTestedPositiveNotLinkedCohortDefinition {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Tested HIV positive in the last 12 months and not linked to care"
    }

    fn query(&self, _ctx: &ReportContext) -> CohortQuery {
        let recent_tests = Predicate::and(vec![
            Predicate::eq("voided", 0i64),
            Predicate::eq("test_type", Self::CONFIRMATORY_TEST),
            Predicate::date_between(
                "visit_date",
                Some(DateBound::reference().months_before(Self::WINDOW_MONTHS)),
                Some(DateBound::reference()),
            ),
        ]);
        let tested_positive = CohortQuery::latest_per_patient(
            Self::TEST_TABLE,
            recent_tests,
            "visit_date",
            Predicate::eq("final_test_result", "Positive"),
        );

        CohortQuery::exclude_matched(
            tested_positive,
            Self::LINKAGE_TABLE,
            Predicate::and(vec![
                Predicate::eq("voided", 0i64),
                Predicate::eq("tracing_status", self.linked_status.as_str()),
            ]),
        )
    }
}

/// Cohort members with the definition and context that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedCohort {
    pub cohort: Cohort,
    pub definition: String,
    pub context: ReportContext,
}

impl EvaluatedCohort {
    pub fn len(&self) -> usize {
        self.cohort.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cohort.is_empty()
    }
}

/// Runs cohort definitions through a [`QueryExecutor`]
pub struct CohortDefinitionEvaluator<'a> {
    executor: &'a dyn QueryExecutor,
}

impl<'a> CohortDefinitionEvaluator<'a> {
    pub fn new(executor: &'a dyn QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn evaluate(
        &self,
        definition: &dyn CohortDefinition,
        ctx: &ReportContext,
    ) -> Result<EvaluatedCohort, ReportError> {
        let query = definition.query(ctx);
        let cohort = self.executor.execute(&query, ctx)?;
        log::debug!("Cohort '{}': {} patients", definition.name(), cohort.len());

        Ok(EvaluatedCohort {
            cohort,
            definition: definition.name().to_string(),
            context: ctx.clone(),
        })
    }
}
