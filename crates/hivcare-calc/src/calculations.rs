//! Observation lookups shared by the rule library
//!
//! Every lookup is bounded by the context's reference time: observations
//! recorded after `ctx.now` do not exist as far as a calculation is concerned.

use crate::context::CalculationContext;
use crate::error::EvalResult;
use crate::value::{CalculationResult, CalculationResultMap};
use chrono::NaiveDateTime;
use hivcare_model::{Cohort, ConceptCode, Observation};

/// Most recent observation of `concept` per patient, `Null` when there is none
pub fn last_obs(
    concept: &ConceptCode,
    cohort: &Cohort,
    ctx: &CalculationContext<'_>,
) -> EvalResult<CalculationResultMap> {
    let mut by_patient = ctx.data.observations(concept, cohort)?;
    Ok(cohort
        .iter()
        .map(|id| {
            let last = by_patient
                .remove(&id)
                .and_then(|list| find_last_on_or_before(&list, ctx.now).cloned());
            (id, CalculationResult::from_obs(last))
        })
        .collect())
}

/// Every observation of `concept` per patient, oldest first
///
/// Patients without observations get an empty list rather than `Null`.
pub fn all_obs(
    concept: &ConceptCode,
    cohort: &Cohort,
    ctx: &CalculationContext<'_>,
) -> EvalResult<CalculationResultMap> {
    let mut by_patient = ctx.data.observations(concept, cohort)?;
    Ok(cohort
        .iter()
        .map(|id| {
            let mut list = by_patient.remove(&id).unwrap_or_default();
            list.retain(|o| o.obs_datetime <= ctx.now);
            list.sort_by_key(|o| o.obs_datetime);
            (id, CalculationResult::ObsList(list))
        })
        .collect())
}

/// The latest observation taken on or before `anchor`
///
/// Ties on `obs_datetime` go to the one listed last. Observations after the
/// anchor are never chosen, however close.
pub fn find_last_on_or_before(observations: &[Observation], anchor: NaiveDateTime) -> Option<&Observation> {
    observations
        .iter()
        .filter(|o| o.obs_datetime <= anchor)
        .max_by_key(|o| o.obs_datetime)
}
