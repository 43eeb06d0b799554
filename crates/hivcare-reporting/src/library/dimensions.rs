//! Gender and DATIM age dimensions over patient demographics

use super::tables;
use crate::cohort::{CohortDefinition, QueryCohortDefinition};
use crate::dataset::Parameter;
use crate::dimension::Dimension;
use crate::error::ReportError;
use crate::mapped::{Mapped, ParameterMapping};
use crate::query::{AgeUnit, CohortQuery, DateBound, Predicate};
use std::sync::Arc;

/// Date the age dimension computes ages on
pub const ON_DATE: &str = "onDate";

/// Age bands as (option, min, max inclusive, unit)
const DATIM_FINE_AGE_BANDS: &[(&str, u32, Option<u32>, AgeUnit)] = &[
    ("<1", 0, Some(0), AgeUnit::Years),
    ("1-4", 1, Some(4), AgeUnit::Years),
    ("5-9", 5, Some(9), AgeUnit::Years),
    ("1-9", 1, Some(9), AgeUnit::Years),
    ("<10", 0, Some(9), AgeUnit::Years),
    ("0-4", 0, Some(4), AgeUnit::Years),
    ("0-14", 0, Some(14), AgeUnit::Years),
    ("10-14", 10, Some(14), AgeUnit::Years),
    ("15-19", 15, Some(19), AgeUnit::Years),
    ("20-24", 20, Some(24), AgeUnit::Years),
    ("25-29", 25, Some(29), AgeUnit::Years),
    ("30-34", 30, Some(34), AgeUnit::Years),
    ("35-39", 35, Some(39), AgeUnit::Years),
    ("40-44", 40, Some(44), AgeUnit::Years),
    ("45-49", 45, Some(49), AgeUnit::Years),
    ("20-49", 20, Some(49), AgeUnit::Years),
    ("50+", 50, None, AgeUnit::Years),
    ("0-2", 0, Some(1), AgeUnit::Months),
    ("2-12", 2, Some(11), AgeUnit::Months),
];

/// `M` and `F` by recorded gender
pub fn gender() -> Result<Dimension, ReportError> {
    let mut dimension = Dimension::new("gender").with_description("Patient gender");
    for option in ["M", "F"] {
        let definition: Arc<dyn CohortDefinition> = Arc::new(QueryCohortDefinition::new(
            format!("gender={}", option),
            CohortQuery::select(tables::DEMOGRAPHICS, Predicate::eq("gender", option)),
        ));
        dimension.add_option(option, Mapped::new(definition, ParameterMapping::new()))?;
    }
    Ok(dimension)
}

/// DATIM fine age groups on `onDate`, including the infant month bands
pub fn datim_fine_age_groups() -> Result<Dimension, ReportError> {
    let mut dimension = Dimension::new("age").with_description("DATIM fine age groups");
    dimension.add_parameter(Parameter::date(ON_DATE, "Date"));

    for (option, min, max, unit) in DATIM_FINE_AGE_BANDS {
        let query = CohortQuery::select(
            tables::DEMOGRAPHICS,
            Predicate::age_between("dob", *min, *max, *unit, DateBound::parameter(ON_DATE)),
        );
        let definition: Arc<dyn CohortDefinition> = Arc::new(
            QueryCohortDefinition::new(format!("age={}", option), query)
                .with_parameter(Parameter::date(ON_DATE, "Date")),
        );
        dimension.add_option(*option, Mapped::new(definition, ParameterMapping::pass_through([ON_DATE])))?;
    }
    Ok(dimension)
}
