//! Dataset and report evaluation
//!
//! Within one evaluation each indicator cohort and each dimension option
//! cohort is queried once and shared by every column that uses it. Nothing
//! is kept between evaluations. The first failing query aborts the report.

use crate::cohort::CohortDefinitionEvaluator;
use crate::context::ReportContext;
use crate::dataset::{CohortIndicator, CohortIndicatorDataSetDefinition, DataSet, DataSetColumn, ParameterKind};
use crate::error::ReportError;
use crate::mapped::Mapped;
use crate::query::QueryExecutor;
use crate::report::ReportDefinition;
use hivcare_model::Cohort;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub const START_DATE: &str = "startDate";
pub const END_DATE: &str = "endDate";

/// Evaluates one dataset definition into counts
pub struct DataSetEvaluator<'a> {
    cohorts: CohortDefinitionEvaluator<'a>,
}

/// Cohorts already queried during one dataset evaluation
///
/// Indicators are keyed by definition address and mapping, so two distinct
/// indicators sharing a name are still queried separately.
#[derive(Default)]
struct RunMemo {
    indicators: HashMap<(usize, String), Cohort>,
    options: HashMap<(String, String), Cohort>,
}

impl<'a> DataSetEvaluator<'a> {
    pub fn new(executor: &'a dyn QueryExecutor) -> Self {
        Self {
            cohorts: CohortDefinitionEvaluator::new(executor),
        }
    }

    pub fn evaluate(
        &self,
        definition: &CohortIndicatorDataSetDefinition,
        ctx: &ReportContext,
    ) -> Result<DataSet, ReportError> {
        let mut memo = RunMemo::default();
        let mut dataset = DataSet::new(definition.name());

        for column in definition.columns() {
            let count = self
                .column_cohort(definition, column, ctx, &mut memo)
                .map_err(|e| ReportError::indicator(&column.indicator.definition.name, e))?
                .len();
            dataset.push(&column.name, &column.label, count);
        }

        log::debug!(
            "Dataset '{}': {} columns, {} indicator cohorts, {} dimension cohorts",
            definition.name(),
            dataset.len(),
            memo.indicators.len(),
            memo.options.len()
        );
        Ok(dataset)
    }

    fn column_cohort(
        &self,
        definition: &CohortIndicatorDataSetDefinition,
        column: &DataSetColumn,
        ctx: &ReportContext,
        memo: &mut RunMemo,
    ) -> Result<Cohort, ReportError> {
        let mut cohort = self.indicator_cohort(&column.indicator, ctx, memo)?;
        for (dimension, option) in &column.dimension_options {
            let members = self
                .option_cohort(definition, dimension, option, ctx, memo)
                .map_err(|e| ReportError::dimension(dimension, option, e))?;
            cohort = cohort.intersection(&members);
        }
        Ok(cohort)
    }

    fn indicator_cohort(
        &self,
        indicator: &Mapped<CohortIndicator>,
        ctx: &ReportContext,
        memo: &mut RunMemo,
    ) -> Result<Cohort, ReportError> {
        let key = (Arc::as_ptr(&indicator.definition) as usize, indicator.mapping.to_string());
        if let Some(cohort) = memo.indicators.get(&key) {
            return Ok(cohort.clone());
        }

        let indicator_ctx = indicator.resolve(ctx)?;
        let mapped = &indicator.definition.cohort;
        let cohort_ctx = mapped.resolve(&indicator_ctx)?;
        let cohort = self.cohorts.evaluate(mapped.definition.as_ref(), &cohort_ctx)?.cohort;

        memo.indicators.insert(key, cohort.clone());
        Ok(cohort)
    }

    fn option_cohort(
        &self,
        definition: &CohortIndicatorDataSetDefinition,
        dimension: &str,
        option: &str,
        ctx: &ReportContext,
        memo: &mut RunMemo,
    ) -> Result<Cohort, ReportError> {
        let key = (dimension.to_string(), option.to_string());
        if let Some(cohort) = memo.options.get(&key) {
            return Ok(cohort.clone());
        }

        let mapped_dimension = definition.dimension(dimension).ok_or_else(|| ReportError::UnknownDimension {
            name: dimension.to_string(),
        })?;
        let mapped_option =
            mapped_dimension
                .definition
                .option(option)
                .ok_or_else(|| ReportError::UnknownDimensionOption {
                    dimension: dimension.to_string(),
                    option: option.to_string(),
                })?;

        let dimension_ctx = mapped_dimension.resolve(ctx)?;
        let option_ctx = mapped_option.resolve(&dimension_ctx)?;
        let cohort = self
            .cohorts
            .evaluate(mapped_option.definition.as_ref(), &option_ctx)?
            .cohort;

        memo.options.insert(key, cohort.clone());
        Ok(cohort)
    }
}

/// Output of one report run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportData {
    pub id: String,
    pub name: String,
    pub context: ReportContext,
    pub datasets: Vec<DataSet>,
}

impl ReportData {
    pub fn dataset(&self, name: &str) -> Option<&DataSet> {
        self.datasets.iter().find(|d| d.name == name)
    }
}

/// Validates report parameters and evaluates every dataset
pub struct ReportRunner<'a> {
    executor: &'a dyn QueryExecutor,
}

impl<'a> ReportRunner<'a> {
    pub fn new(executor: &'a dyn QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn run(&self, report: &ReportDefinition, ctx: &ReportContext) -> Result<ReportData, ReportError> {
        validate_parameters(report, ctx)?;
        log::info!("Running report '{}' ({} datasets)", report.id, report.datasets.len());

        let evaluator = DataSetEvaluator::new(self.executor);
        let mut datasets = Vec::with_capacity(report.datasets.len());
        for mapped in &report.datasets {
            let dataset_ctx = mapped.resolve(ctx)?;
            datasets.push(evaluator.evaluate(&mapped.definition, &dataset_ctx)?);
        }

        Ok(ReportData {
            id: report.id.clone(),
            name: report.name.clone(),
            context: ctx.clone(),
            datasets,
        })
    }
}

/// Date parameters are required; the reporting period must not be reversed
fn validate_parameters(report: &ReportDefinition, ctx: &ReportContext) -> Result<(), ReportError> {
    for parameter in &report.parameters {
        if parameter.kind == ParameterKind::Date {
            ctx.date_parameter(&parameter.name)?;
        }
    }

    if report.parameter(START_DATE).is_some() && report.parameter(END_DATE).is_some() {
        let start = ctx.date_parameter(START_DATE)?;
        let end = ctx.date_parameter(END_DATE)?;
        if start > end {
            return Err(ReportError::invalid_parameter(
                START_DATE,
                format!("start date {} is after end date {}", start, end),
            ));
        }
    }
    Ok(())
}
