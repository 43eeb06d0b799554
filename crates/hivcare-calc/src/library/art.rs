//! Antiretroviral therapy status

use crate::calculation::PatientCalculation;
use crate::calculations::last_obs;
use crate::context::CalculationContext;
use crate::error::EvalResult;
use crate::value::{CalculationResult, CalculationResultMap};
use hivcare_model::Cohort;

/// Whether the patient has an ARV drug order active at the reference time
#[derive(Debug, Default, Clone, Copy)]
pub struct OnArtCalculation;

impl OnArtCalculation {
    pub const NAME: &'static str = "on-art";

    pub fn new() -> Self {
        Self
    }
}

impl PatientCalculation for OnArtCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, cohort: &Cohort, ctx: &CalculationContext<'_>) -> EvalResult<CalculationResultMap> {
        let orders = ctx.data.drug_orders(cohort)?;
        let results: CalculationResultMap = cohort
            .iter()
            .map(|id| {
                let on_art = orders.get(&id).is_some_and(|list| {
                    list.iter()
                        .any(|order| ctx.catalog.is_arv(&order.drug) && order.is_active_on(ctx.now))
                });
                (id, CalculationResult::boolean(on_art))
            })
            .collect();
        log::debug!(
            "{}: {} of {} patients on ART",
            Self::NAME,
            results.patients_that_pass().len(),
            cohort.len()
        );
        Ok(results)
    }
}

/// Date the patient first started ART
///
/// The earlier of the first ARV order and the start date recorded at
/// transfer-in. `Null` when neither is known by the reference time.
#[derive(Debug, Default, Clone, Copy)]
pub struct InitialArtStartDateCalculation;

impl InitialArtStartDateCalculation {
    pub const NAME: &'static str = "initial-art-start-date";

    pub fn new() -> Self {
        Self
    }
}

impl PatientCalculation for InitialArtStartDateCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, cohort: &Cohort, ctx: &CalculationContext<'_>) -> EvalResult<CalculationResultMap> {
        let orders = ctx.data.drug_orders(cohort)?;
        let transfer_in = last_obs(&ctx.catalog.art_start_date, cohort, ctx)?;

        Ok(cohort
            .iter()
            .map(|id| {
                let first_order = orders.get(&id).and_then(|list| {
                    list.iter()
                        .filter(|order| ctx.catalog.is_arv(&order.drug) && order.date_activated <= ctx.now)
                        .map(|order| order.date_activated)
                        .min()
                });
                let recorded = transfer_in.obs_for(id).and_then(|obs| obs.value_datetime());
                let start = match (first_order, recorded) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                (id, CalculationResult::from_date(start))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use hivcare_model::{
        ConceptCode, DrugOrder, InMemoryPatientStore, MetadataCatalog, ObsValue, Observation, Patient,
        PatientId, Sex,
    };

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn tdf() -> ConceptCode {
        ConceptCode::ciel(84795)
    }

    #[test]
    fn test_on_art() {
        let store = InMemoryPatientStore::new()
            .with_patient(Patient::new(1, Sex::Female))
            .with_patient(Patient::new(2, Sex::Female))
            .with_patient(Patient::new(3, Sex::Female))
            .with_patient(Patient::new(4, Sex::Female))
            .with_drug_order(DrugOrder::new(1, tdf(), at(2023, 1, 1)))
            .with_drug_order(DrugOrder::new(2, tdf(), at(2023, 1, 1)).stopped(at(2024, 1, 1)))
            .with_drug_order(DrugOrder::new(3, ConceptCode::new("paracetamol"), at(2023, 1, 1)))
            .with_drug_order(DrugOrder::new(4, tdf(), at(2024, 7, 1)));
        let catalog = MetadataCatalog::default();
        let ctx = CalculationContext::new(at(2024, 6, 1), &catalog, &store);
        let cohort: Cohort = [1u32, 2, 3, 4].into_iter().collect();

        let results = OnArtCalculation::new().evaluate(&cohort, &ctx).unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.is_true(PatientId(1)));
        assert!(!results.is_true(PatientId(2)));
        assert!(!results.is_true(PatientId(3)));
        assert!(!results.is_true(PatientId(4)));
    }

    #[test]
    fn test_initial_art_start_prefers_earliest_source() {
        let catalog = MetadataCatalog::default();
        let store = InMemoryPatientStore::new()
            .with_patient(Patient::new(1, Sex::Female))
            .with_patient(Patient::new(2, Sex::Male))
            .with_patient(Patient::new(3, Sex::Male))
            .with_drug_order(DrugOrder::new(1, tdf(), at(2023, 5, 1)))
            .with_drug_order(DrugOrder::new(1, tdf(), at(2022, 5, 1)).stopped(at(2022, 6, 1)))
            .with_drug_order(DrugOrder::new(2, tdf(), at(2023, 5, 1)))
            .with_observation(Observation::new(
                2,
                catalog.art_start_date.clone(),
                Some(ObsValue::Datetime(at(2019, 2, 1))),
                at(2023, 5, 1),
            ));
        let ctx = CalculationContext::new(at(2024, 6, 1), &catalog, &store);
        let cohort: Cohort = [1u32, 2, 3].into_iter().collect();

        let results = InitialArtStartDateCalculation::new().evaluate(&cohort, &ctx).unwrap();
        assert_eq!(results.datetime_for(PatientId(1)), Some(at(2022, 5, 1)));
        assert_eq!(results.datetime_for(PatientId(2)), Some(at(2019, 2, 1)));
        assert_eq!(results.get(PatientId(3)), Some(&CalculationResult::Null));
    }
}
