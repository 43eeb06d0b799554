//! Viral load monitoring alert

use crate::calculation::{PatientCalculation, PatientFlagCalculation};
use crate::calculations::{all_obs, last_obs};
use crate::context::CalculationContext;
use crate::dates::{add_months, days_since, months_between};
use crate::error::{EvalError, EvalResult};
use crate::filters;
use crate::library::art::{InitialArtStartDateCalculation, OnArtCalculation};
use crate::value::{CalculationResult, CalculationResultMap};
use chrono::NaiveDateTime;
use hivcare_model::{Cohort, Observation};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Viral load above which a patient counts as unsuppressed (copies/ml)
const UNSUPPRESSED_COPIES: u32 = 1000;

/// Whether a patient on ART is due for a viral load test
///
/// Only alive patients actively enrolled in HIV care and currently on ART can
/// be flagged. For them the flag is raised when any of these holds:
///
/// - no viral load was ever recorded and ART started more than 180 but less
///   than 360 days ago
/// - the last viral load is more than 360 days old
/// - the last viral load was above 1000 copies and is more than 90 days old
/// - the patient is pregnant with a known ART start, and either has no viral
///   load and started ART at least six months ago, or had a last viral load
///   above 1000 copies at least three calendar months ago
///
/// Every cohort member gets a result; patients who cannot be flagged get
/// `false`.
pub struct NeedsViralLoadTestCalculation {
    on_art: Arc<dyn PatientCalculation>,
    art_start_date: Arc<dyn PatientCalculation>,
}

impl NeedsViralLoadTestCalculation {
    pub const NAME: &'static str = "needs-viral-load-test";
    pub const FLAG_MESSAGE: &'static str = "Due for Viral Load";

    pub fn new() -> Self {
        Self::with_dependencies(
            Arc::new(OnArtCalculation::new()),
            Arc::new(InitialArtStartDateCalculation::new()),
        )
    }

    /// Use other rules for "on ART" (boolean) and "ART start date" (date)
    pub fn with_dependencies(
        on_art: Arc<dyn PatientCalculation>,
        art_start_date: Arc<dyn PatientCalculation>,
    ) -> Self {
        Self { on_art, art_start_date }
    }

    fn delegate(
        calculation: &dyn PatientCalculation,
        cohort: &Cohort,
        ctx: &CalculationContext<'_>,
    ) -> EvalResult<CalculationResultMap> {
        calculation
            .evaluate(cohort, ctx)
            .map_err(|e| EvalError::delegated(calculation.name(), e))
    }
}

impl Default for NeedsViralLoadTestCalculation {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything known about one eligible patient
struct ViralLoadHistory<'r> {
    art_start: Option<NaiveDateTime>,
    last_vl: Option<&'r Observation>,
    ever_tested: bool,
    pregnant: bool,
}

impl ViralLoadHistory<'_> {
    fn is_due(&self, ctx: &CalculationContext<'_>) -> bool {
        let unsuppressed = self
            .last_vl
            .and_then(Observation::value_numeric)
            .is_some_and(|v| v > Decimal::from(UNSUPPRESSED_COPIES));

        if let (false, Some(start)) = (self.ever_tested, self.art_start) {
            let days = days_since(start, ctx);
            if days > 180 && days < 360 {
                return true;
            }
        }

        if let Some(last) = self.last_vl {
            let days = days_since(last.obs_datetime, ctx);
            if days > 360 {
                return true;
            }
            if unsuppressed && days > 90 {
                return true;
            }
        }

        match (self.pregnant, self.art_start, self.last_vl) {
            (true, Some(start), None) => ctx.now >= add_months(start, 6),
            (true, Some(_), Some(last)) => unsuppressed && months_between(last.obs_datetime, ctx.now) >= 3,
            _ => false,
        }
    }
}

impl PatientCalculation for NeedsViralLoadTestCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, cohort: &Cohort, ctx: &CalculationContext<'_>) -> EvalResult<CalculationResultMap> {
        let alive = filters::alive(cohort, ctx)?;
        let in_care = filters::in_program(&ctx.catalog.hiv_program, &alive, ctx)?;
        let on_art = Self::delegate(self.on_art.as_ref(), cohort, ctx)?;
        let eligible = in_care.intersection(&on_art.patients_that_pass());

        let last_vl = last_obs(&ctx.catalog.hiv_viral_load, cohort, ctx)?;
        let all_vl = all_obs(&ctx.catalog.hiv_viral_load, cohort, ctx)?;
        let art_start = Self::delegate(self.art_start_date.as_ref(), cohort, ctx)?;
        let alive_females = filters::female(&alive, ctx)?;
        let pregnancy = last_obs(&ctx.catalog.pregnancy_status, &alive_females, ctx)?;

        let results: CalculationResultMap = cohort
            .iter()
            .map(|id| {
                let due = eligible.contains(id)
                    && ViralLoadHistory {
                        art_start: art_start.datetime_for(id),
                        last_vl: last_vl.obs_for(id),
                        ever_tested: all_vl.obs_list_for(id).is_some_and(|list| !list.is_empty()),
                        pregnant: pregnancy
                            .obs_for(id)
                            .and_then(Observation::value_coded)
                            .is_some_and(|answer| answer == &ctx.catalog.yes),
                    }
                    .is_due(ctx);
                (id, CalculationResult::flag(due, Self::FLAG_MESSAGE))
            })
            .collect();

        log::debug!(
            "{}: {} eligible, {} flagged out of {}",
            Self::NAME,
            eligible.len(),
            results.patients_that_pass().len(),
            cohort.len()
        );
        Ok(results)
    }
}

impl PatientFlagCalculation for NeedsViralLoadTestCalculation {
    fn flag_message(&self) -> &str {
        Self::FLAG_MESSAGE
    }
}
