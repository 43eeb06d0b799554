//! Calculation traits

use crate::context::CalculationContext;
use crate::error::EvalResult;
use crate::value::CalculationResultMap;
use hivcare_model::Cohort;

/// A rule that computes one result for every patient in a cohort
///
/// Implementations must answer every cohort member, hold no state between
/// calls, and read nothing but the cohort and the context.
pub trait PatientCalculation: Send + Sync {
    /// Registry name of the calculation
    fn name(&self) -> &str;

    /// Evaluate the calculation for every member of `cohort`
    fn evaluate(&self, cohort: &Cohort, ctx: &CalculationContext<'_>) -> EvalResult<CalculationResultMap>;
}

/// A calculation whose `true` results are shown to clinicians as alerts
pub trait PatientFlagCalculation: PatientCalculation {
    /// Short message shown when the flag is raised
    fn flag_message(&self) -> &str;
}
