//! Cohort filters shared by the rule library

use crate::context::CalculationContext;
use crate::error::EvalResult;
use hivcare_model::{Cohort, Sex};

/// Members alive at the reference time
pub fn alive(cohort: &Cohort, ctx: &CalculationContext<'_>) -> EvalResult<Cohort> {
    let patients = ctx.data.patients(cohort)?;
    Ok(patients
        .iter()
        .filter(|p| p.is_alive(ctx.now))
        .map(|p| p.id)
        .collect())
}

/// Members recorded as female
pub fn female(cohort: &Cohort, ctx: &CalculationContext<'_>) -> EvalResult<Cohort> {
    let patients = ctx.data.patients(cohort)?;
    Ok(patients
        .iter()
        .filter(|p| p.sex == Sex::Female)
        .map(|p| p.id)
        .collect())
}

/// Members with an enrollment in `program` active at the reference time
pub fn in_program(program: &str, cohort: &Cohort, ctx: &CalculationContext<'_>) -> EvalResult<Cohort> {
    let enrollments = ctx.data.enrollments(program, cohort)?;
    Ok(enrollments
        .into_iter()
        .filter(|(_, list)| list.iter().any(|e| e.is_active_on(ctx.now)))
        .map(|(id, _)| id)
        .collect())
}
