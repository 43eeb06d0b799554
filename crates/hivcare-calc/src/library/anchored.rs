//! Observation values taken as of an anchor date

use crate::calculation::PatientCalculation;
use crate::calculations::find_last_on_or_before;
use crate::context::CalculationContext;
use crate::error::{EvalError, EvalResult};
use crate::library::art::InitialArtStartDateCalculation;
use crate::value::{CalculationResult, CalculationResultMap};
use hivcare_model::{Cohort, ConceptCode};
use std::sync::Arc;

/// Numeric value of a concept as it stood on a per-patient anchor date
///
/// The anchor comes from another calculation producing a date. The result is
/// the value of the last observation taken on or before the anchor (and never
/// after the reference time); it is
/// `Null` when the anchor is unknown, nothing was recorded by then, or the
/// chosen observation has no numeric value.
pub struct ObsAtAnchorCalculation {
    name: String,
    concept: ConceptCode,
    anchor: Arc<dyn PatientCalculation>,
}

impl ObsAtAnchorCalculation {
    pub fn new(name: impl Into<String>, concept: ConceptCode, anchor: Arc<dyn PatientCalculation>) -> Self {
        Self {
            name: name.into(),
            concept,
            anchor,
        }
    }

    pub fn concept(&self) -> &ConceptCode {
        &self.concept
    }
}

impl PatientCalculation for ObsAtAnchorCalculation {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, cohort: &Cohort, ctx: &CalculationContext<'_>) -> EvalResult<CalculationResultMap> {
        let anchors = self
            .anchor
            .evaluate(cohort, ctx)
            .map_err(|e| EvalError::delegated(self.anchor.name(), e))?;
        let observations = ctx.data.observations(&self.concept, cohort)?;

        Ok(cohort
            .iter()
            .map(|id| {
                let value = anchors.datetime_for(id).and_then(|anchor| {
                    observations
                        .get(&id)
                        .and_then(|list| find_last_on_or_before(list, anchor.min(ctx.now)))
                        .and_then(|obs| obs.value_numeric())
                });
                (id, CalculationResult::from_numeric(value))
            })
            .collect())
    }
}

/// Body mass index recorded at or before ART initiation
///
/// The concept is read from the context's catalog on every evaluation.
pub struct BmiAtArtStartCalculation {
    art_start_date: Arc<dyn PatientCalculation>,
}

impl BmiAtArtStartCalculation {
    pub const NAME: &'static str = "bmi-at-art-start";

    pub fn new() -> Self {
        Self {
            art_start_date: Arc::new(InitialArtStartDateCalculation::new()),
        }
    }
}

impl Default for BmiAtArtStartCalculation {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientCalculation for BmiAtArtStartCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, cohort: &Cohort, ctx: &CalculationContext<'_>) -> EvalResult<CalculationResultMap> {
        ObsAtAnchorCalculation::new(Self::NAME, ctx.catalog.bmi.clone(), self.art_start_date.clone())
            .evaluate(cohort, ctx)
    }
}
