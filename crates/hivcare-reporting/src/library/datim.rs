//! DATIM care and treatment indicators
//!
//! Every indicator is a declarative cohort over the ETL tables, evaluated for
//! a reporting period given as `startDate` and `endDate`. All tables carry a
//! `voided` flag; voided rows never count.
//!
//! Columns read per table:
//!
//! | table                          | columns |
//! |--------------------------------|---------|
//! | `etl_patient_demographics`     | `gender`, `dob` |
//! | `etl_hts_test`                 | `visit_date`, `test_type`, `final_test_result`, `hts_entry_point`, `recency_test_result` |
//! | `etl_hts_referral_and_linkage` | `tracing_status` |
//! | `etl_drug_event`               | `program`, `date_started`, `date_discontinued` |
//! | `etl_laboratory_extract`       | `lab_test`, `visit_date`, `test_result`, `order_reason` |
//! | `etl_mch_enrollment`           | `visit_date`, `hiv_status`, `art_status` |
//! | `etl_hiv_followup`             | `visit_date`, `next_appointment_date`, `pregnancy_status`, `breastfeeding`, `tb_status` |
//! | `etl_hei_enrollment`           | `first_pcr_date`, `first_pcr_result`, `final_hiv_status`, `exit_reason` |

use super::tables;
use crate::cohort::{CohortDefinition, QueryCohortDefinition};
use crate::dataset::{CohortIndicator, Parameter};
use crate::evaluator::{END_DATE, START_DATE};
use crate::mapped::{Mapped, ParameterMapping};
use crate::query::{AgeUnit, CohortQuery, DateBound, Predicate};
use std::sync::Arc;

/// Viral load results below this many copies/ml are suppressed
pub const SUPPRESSION_THRESHOLD: i64 = 1000;
/// Result text for a viral load below the detection limit
pub const LOWER_THAN_DETECTABLE: &str = "LDL";
pub const VIRAL_LOAD_TEST: &str = "HIV VIRAL LOAD";
pub const HIV_PROGRAM: &str = "HIV";

/// Why a viral load test was ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViralLoadIndication {
    Routine,
    Targeted,
    /// No reason recorded
    Undocumented,
}

impl ViralLoadIndication {
    fn predicate(self) -> Predicate {
        match self {
            Self::Routine => Predicate::eq("order_reason", "Routine"),
            Self::Targeted => Predicate::eq("order_reason", "Targeted"),
            Self::Undocumented => Predicate::is_null("order_reason"),
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::Targeted => "targeted",
            Self::Undocumented => "undocumented",
        }
    }
}

/// Status recorded at a patient's latest HIV follow-up visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FollowupStatus {
    Pregnant,
    Breastfeeding,
}

impl FollowupStatus {
    fn column(self) -> &'static str {
        match self {
            Self::Pregnant => "pregnancy_status",
            Self::Breastfeeding => "breastfeeding",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Self::Pregnant => "pregnant",
            Self::Breastfeeding => "bf",
        }
    }
}

/// Indicator definitions for the DATIM quarterly report
#[derive(Debug, Clone, Copy, Default)]
pub struct DatimIndicatorLibrary;

// ===== Query building blocks =====

fn start() -> DateBound {
    DateBound::parameter(START_DATE)
}

fn end() -> DateBound {
    DateBound::parameter(END_DATE)
}

fn not_voided() -> Predicate {
    Predicate::eq("voided", 0i64)
}

fn in_period(column: &str) -> Predicate {
    Predicate::date_between(column, Some(start()), Some(end()))
}

fn on_or_before_end(column: &str) -> Predicate {
    Predicate::date_between(column, None, Some(end()))
}

fn hiv_drug_event(filter: Predicate) -> CohortQuery {
    CohortQuery::select(
        tables::DRUG_EVENT,
        Predicate::and(vec![not_voided(), Predicate::eq("program", HIV_PROGRAM), filter]),
    )
}

fn hts_test_in_period(filter: Predicate) -> CohortQuery {
    CohortQuery::select(
        tables::HTS_TEST,
        Predicate::and(vec![not_voided(), in_period("visit_date"), filter]),
    )
}

fn mch_enrollment_in_period(filter: Predicate) -> CohortQuery {
    CohortQuery::select(
        tables::MCH_ENROLLMENT,
        Predicate::and(vec![not_voided(), in_period("visit_date"), filter]),
    )
}

fn hei_enrollment(filter: Predicate) -> CohortQuery {
    CohortQuery::select(tables::HEI_ENROLLMENT, Predicate::and(vec![not_voided(), filter]))
}

impl DatimIndicatorLibrary {
    pub fn new() -> Self {
        Self
    }

    /// Wrap a query as an indicator over the reporting period
    fn indicator(&self, name: &str, description: &str, query: CohortQuery) -> Arc<CohortIndicator> {
        let definition: Arc<dyn CohortDefinition> = Arc::new(
            QueryCohortDefinition::new(name, query)
                .with_description(description)
                .with_parameter(Parameter::date(START_DATE, "Start Date"))
                .with_parameter(Parameter::date(END_DATE, "End Date")),
        );
        let cohort = Mapped::new(definition, ParameterMapping::pass_through([START_DATE, END_DATE]));
        Arc::new(CohortIndicator::new(name, cohort))
    }

    // ===== Shared cohorts =====

    /// First started ART during the period
    pub fn started_art_query(&self) -> CohortQuery {
        CohortQuery::difference(
            hiv_drug_event(in_period("date_started")),
            hiv_drug_event(Predicate::date_before("date_started", start())),
        )
    }

    /// Started ART on or before the end date and not discontinued by then
    pub fn on_art_at_end_query(&self) -> CohortQuery {
        hiv_drug_event(Predicate::and(vec![
            on_or_before_end("date_started"),
            Predicate::or(vec![
                Predicate::is_null("date_discontinued"),
                Predicate::negate(on_or_before_end("date_discontinued")),
            ]),
        ]))
    }

    /// Latest follow-up on or before the end date records the status
    fn status_at_end_query(&self, status: FollowupStatus) -> CohortQuery {
        CohortQuery::latest_per_patient(
            tables::HIV_FOLLOWUP,
            Predicate::and(vec![not_voided(), on_or_before_end("visit_date")]),
            "visit_date",
            Predicate::eq(status.column(), "Yes"),
        )
    }

    /// Any follow-up during the period records the status
    fn status_in_period_query(&self, column: &str, values: &[&str]) -> CohortQuery {
        CohortQuery::select(
            tables::HIV_FOLLOWUP,
            Predicate::and(vec![
                not_voided(),
                in_period("visit_date"),
                Predicate::is_in(column, values.iter().copied()),
            ]),
        )
    }

    /// On ART whose latest viral load in the 12 months to the end date had
    /// the given indication, and was suppressed when `suppressed` is set
    pub fn viral_load_query(&self, indication: ViralLoadIndication, suppressed: bool) -> CohortQuery {
        let mut then = vec![indication.predicate()];
        if suppressed {
            then.push(Predicate::or(vec![
                Predicate::less_than("test_result", SUPPRESSION_THRESHOLD),
                Predicate::eq("test_result", LOWER_THAN_DETECTABLE),
            ]));
        }
        let latest_result = CohortQuery::latest_per_patient(
            tables::LABORATORY,
            Predicate::and(vec![
                not_voided(),
                Predicate::eq("lab_test", VIRAL_LOAD_TEST),
                Predicate::date_between("visit_date", Some(end().months_before(12)), Some(end())),
            ]),
            "visit_date",
            Predicate::and(then),
        );
        CohortQuery::intersect(vec![self.on_art_at_end_query(), latest_result])
    }

    /// Born 24 months before the period and registered as HIV-exposed infants
    pub fn hei_cohort_query(&self) -> CohortQuery {
        CohortQuery::intersect(vec![
            CohortQuery::select(
                tables::DEMOGRAPHICS,
                Predicate::date_between("dob", Some(start().months_before(24)), Some(end().months_before(24))),
            ),
            hei_enrollment(Predicate::all()),
        ])
    }

    // ===== HTS =====

    /// Tested at an entry point during the period with the given final result
    pub fn tested_at(&self, entry_point: &str, result: &str) -> Arc<CohortIndicator> {
        self.indicator(
            &format!("hts-{}-{}", entry_point.to_lowercase(), result.to_lowercase()),
            &format!("Tested HIV {} at {}", result, entry_point),
            hts_test_in_period(Predicate::and(vec![
                Predicate::eq("hts_entry_point", entry_point),
                Predicate::eq("final_test_result", result),
            ])),
        )
    }

    pub fn tested_through_index_services(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "hts-index",
            "Identified and tested through index services and received results",
            hts_test_in_period(Predicate::and(vec![
                Predicate::eq("hts_entry_point", "Index"),
                Predicate::is_in("final_test_result", ["Positive", "Negative"]),
            ])),
        )
    }

    pub fn recent_hiv_infections(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "hts-recent",
            "Aged 15+ newly diagnosed with a test for recent infection",
            CohortQuery::intersect(vec![
                hts_test_in_period(Predicate::and(vec![
                    Predicate::eq("final_test_result", "Positive"),
                    Predicate::not_null("recency_test_result"),
                ])),
                CohortQuery::select(
                    tables::DEMOGRAPHICS,
                    Predicate::age_between("dob", 15, None, AgeUnit::Years, end()),
                ),
            ]),
        )
    }

    // ===== PMTCT =====

    pub fn clients_with_known_hiv_status_at_anc(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "pmtct-sta-numerator",
            "Known HIV status at ANC",
            mch_enrollment_in_period(Predicate::is_in("hiv_status", ["Positive", "Negative"])),
        )
    }

    pub fn clients_newly_enrolled_to_anc(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "pmtct-sta-denominator",
            "Newly enrolled to ANC",
            mch_enrollment_in_period(Predicate::all()),
        )
    }

    pub fn mothers_already_on_art(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "pmtct-art-already",
            "Already on ART at the start of current pregnancy",
            mch_enrollment_in_period(Predicate::eq("art_status", "Already on ART")),
        )
    }

    pub fn mothers_new_on_art(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "pmtct-art-new",
            "New on ART during current pregnancy",
            mch_enrollment_in_period(Predicate::eq("art_status", "New on ART")),
        )
    }

    /// Infants with a first PCR during the period; `None` means no result yet
    pub fn infants_tested_for_virology(&self, result: Option<&str>) -> Arc<CohortIndicator> {
        let (slug, outcome) = match result {
            Some(result) => (result.to_lowercase(), Predicate::eq("first_pcr_result", result)),
            None => ("no-result".to_string(), Predicate::is_null("first_pcr_result")),
        };
        self.indicator(
            &format!("pmtct-eid-{}", slug),
            "Infants tested for virology",
            hei_enrollment(Predicate::and(vec![in_period("first_pcr_date"), outcome])),
        )
    }

    pub fn total_hei(&self) -> Arc<CohortIndicator> {
        self.indicator("pmtct-fo-cohort", "HEI birth cohort", self.hei_cohort_query())
    }

    /// HEI birth cohort members with the given final status
    pub fn hei_with_final_status(&self, status: &str) -> Arc<CohortIndicator> {
        self.indicator(
            &format!("pmtct-fo-{}", status.to_lowercase()),
            &format!("HEI cohort with final HIV status {}", status),
            CohortQuery::intersect(vec![
                self.hei_cohort_query(),
                hei_enrollment(Predicate::eq("final_hiv_status", status)),
            ]),
        )
    }

    pub fn hei_unknown_status(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "pmtct-fo-unknown",
            "HEI cohort with unknown HIV status",
            CohortQuery::intersect(vec![
                self.hei_cohort_query(),
                hei_enrollment(Predicate::and(vec![
                    Predicate::is_null("final_hiv_status"),
                    Predicate::or(vec![
                        Predicate::is_null("exit_reason"),
                        Predicate::not_eq("exit_reason", "Died"),
                    ]),
                ])),
            ]),
        )
    }

    pub fn hei_died_status_unknown(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "pmtct-fo-died-unknown",
            "HEI died with unknown HIV status",
            CohortQuery::intersect(vec![
                self.hei_cohort_query(),
                hei_enrollment(Predicate::and(vec![
                    Predicate::is_null("final_hiv_status"),
                    Predicate::eq("exit_reason", "Died"),
                ])),
            ]),
        )
    }

    // ===== TX_NEW =====

    pub fn newly_started_art(&self) -> Arc<CohortIndicator> {
        self.indicator("tx-new", "Newly started ART", self.started_art_query())
    }

    /// Newly started ART and reported pregnant during the period
    pub fn newly_started_art_while_pregnant(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "tx-new-pregnant",
            "Newly started ART while pregnant",
            CohortQuery::intersect(vec![
                self.started_art_query(),
                self.status_in_period_query(FollowupStatus::Pregnant.column(), &["Yes"]),
            ]),
        )
    }

    /// Newly started ART and pregnant at the latest follow-up by the end date
    pub fn started_art_and_pregnant(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "tx-new-art-pregnant",
            "Started on ART and pregnant",
            CohortQuery::intersect(vec![
                self.started_art_query(),
                self.status_at_end_query(FollowupStatus::Pregnant),
            ]),
        )
    }

    pub fn newly_started_art_while_breastfeeding(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "tx-new-bf",
            "Newly started ART while breastfeeding",
            CohortQuery::intersect(vec![
                self.started_art_query(),
                self.status_in_period_query(FollowupStatus::Breastfeeding.column(), &["Yes"]),
            ]),
        )
    }

    /// Newly started ART with TB confirmed during the period
    pub fn started_art_and_tb_coinfected(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "tx-new-tb-coinfected",
            "Started on ART and TB co-infected",
            CohortQuery::intersect(vec![
                self.started_art_query(),
                self.status_in_period_query("tb_status", &["TB Confirmed"]),
            ]),
        )
    }

    /// Newly started ART with TB confirmed or on TB treatment during the period
    pub fn newly_started_art_with_tb(&self) -> Arc<CohortIndicator> {
        self.indicator(
            "tx-new-tb",
            "Newly started ART with confirmed or treated TB",
            CohortQuery::intersect(vec![
                self.started_art_query(),
                self.status_in_period_query("tb_status", &["TB Confirmed", "On TB Treatment"]),
            ]),
        )
    }

    // ===== TX_PVLS =====

    pub fn on_art_with_viral_load(&self, indication: ViralLoadIndication, suppressed: bool) -> Arc<CohortIndicator> {
        let kind = if suppressed { "supp" } else { "denominator" };
        self.indicator(
            &format!("tx-pvls-{}-{}", kind, indication.slug()),
            "On ART with a viral load result in the last 12 months",
            self.viral_load_query(indication, suppressed),
        )
    }

    pub fn pregnant_on_art_with_viral_load(
        &self,
        indication: ViralLoadIndication,
        suppressed: bool,
    ) -> Arc<CohortIndicator> {
        self.viral_load_with_status(FollowupStatus::Pregnant, indication, suppressed)
    }

    pub fn breastfeeding_on_art_with_viral_load(
        &self,
        indication: ViralLoadIndication,
        suppressed: bool,
    ) -> Arc<CohortIndicator> {
        self.viral_load_with_status(FollowupStatus::Breastfeeding, indication, suppressed)
    }

    fn viral_load_with_status(
        &self,
        status: FollowupStatus,
        indication: ViralLoadIndication,
        suppressed: bool,
    ) -> Arc<CohortIndicator> {
        let kind = if suppressed { "supp" } else { "denominator" };
        self.indicator(
            &format!("tx-pvls-{}-{}-{}", kind, status.slug(), indication.slug()),
            "On ART with a viral load result in the last 12 months",
            CohortQuery::intersect(vec![
                self.viral_load_query(indication, suppressed),
                self.status_at_end_query(status),
            ]),
        )
    }

    // ===== TX_ML =====

    /// On ART whose latest follow-up set an appointment during the period
    /// that fell before the end date with no visit since
    pub fn on_art_missed_appointment(&self) -> Arc<CohortIndicator> {
        let missed = CohortQuery::latest_per_patient(
            tables::HIV_FOLLOWUP,
            Predicate::and(vec![not_voided(), on_or_before_end("visit_date")]),
            "visit_date",
            Predicate::and(vec![
                Predicate::date_between("next_appointment_date", Some(start()), None),
                Predicate::date_before("next_appointment_date", end()),
            ]),
        );
        self.indicator(
            "tx-ml",
            "No clinical contact since last expected contact",
            CohortQuery::intersect(vec![self.on_art_at_end_query(), missed]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ReportContext;
    use crate::query::{FieldValue, QueryExecutor, Row, row};
    use crate::store::InMemoryEventStore;
    use chrono::NaiveDate;
    use hivcare_model::Cohort;
    use pretty_assertions::assert_eq;

    // ===== Test Helpers =====

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(list: &[u32]) -> Cohort {
        list.iter().copied().collect()
    }

    fn ctx() -> ReportContext {
        ReportContext::new(date(2024, 10, 15))
            .with_parameter(START_DATE, date(2024, 7, 1))
            .with_parameter(END_DATE, date(2024, 9, 30))
    }

    fn run(store: &InMemoryEventStore, indicator: &CohortIndicator) -> Cohort {
        let ctx = indicator.cohort.resolve(&ctx()).unwrap();
        store.execute(&indicator.cohort.definition.query(&ctx), &ctx).unwrap()
    }

    fn drug_event(patient: i64, started: NaiveDate, discontinued: Option<NaiveDate>) -> Row {
        row([
            ("patient_id", FieldValue::Int(patient)),
            ("program", "HIV".into()),
            ("date_started", started.into()),
            ("date_discontinued", discontinued.into()),
            ("voided", FieldValue::Int(0)),
        ])
    }

    fn lab(patient: i64, visit: NaiveDate, result: FieldValue, reason: Option<&str>) -> Row {
        row([
            ("patient_id", FieldValue::Int(patient)),
            ("lab_test", VIRAL_LOAD_TEST.into()),
            ("visit_date", visit.into()),
            ("test_result", result),
            ("order_reason", reason.into()),
            ("voided", FieldValue::Int(0)),
        ])
    }

    fn followup(patient: i64, visit: NaiveDate, next: NaiveDate, pregnant: &str) -> Row {
        row([
            ("patient_id", FieldValue::Int(patient)),
            ("visit_date", visit.into()),
            ("next_appointment_date", next.into()),
            ("pregnancy_status", pregnant.into()),
            ("voided", FieldValue::Int(0)),
        ])
    }

    // ===== TX_NEW =====

    #[test]
    fn test_newly_started_excludes_earlier_starts() {
        let store = InMemoryEventStore::new()
            .with_row(tables::DRUG_EVENT, drug_event(1, date(2024, 7, 1), None))
            .with_row(tables::DRUG_EVENT, drug_event(2, date(2024, 8, 1), None))
            .with_row(tables::DRUG_EVENT, drug_event(2, date(2023, 1, 1), Some(date(2023, 6, 1))))
            .with_row(tables::DRUG_EVENT, drug_event(3, date(2024, 10, 1), None));

        assert_eq!(run(&store, &DatimIndicatorLibrary::new().newly_started_art()), ids(&[1]));
    }

    #[test]
    fn test_on_art_at_end() {
        let store = InMemoryEventStore::new()
            .with_row(tables::DRUG_EVENT, drug_event(1, date(2020, 1, 1), None))
            .with_row(tables::DRUG_EVENT, drug_event(2, date(2020, 1, 1), Some(date(2024, 9, 30))))
            .with_row(tables::DRUG_EVENT, drug_event(3, date(2020, 1, 1), Some(date(2024, 10, 1))));

        let library = DatimIndicatorLibrary::new();
        let on_art = library.indicator("on-art", "", library.on_art_at_end_query());
        assert_eq!(run(&store, &on_art), ids(&[1, 3]));
    }

    #[test]
    fn test_pregnant_in_period_and_at_end_differ() {
        let store = InMemoryEventStore::new()
            .with_row(tables::DRUG_EVENT, drug_event(1, date(2024, 7, 10), None))
            .with_row(tables::DRUG_EVENT, drug_event(2, date(2024, 7, 10), None))
            .with_row(tables::HIV_FOLLOWUP, followup(1, date(2024, 7, 10), date(2024, 8, 10), "Yes"))
            .with_row(tables::HIV_FOLLOWUP, followup(1, date(2024, 9, 1), date(2024, 12, 1), "No"))
            .with_row(tables::HIV_FOLLOWUP, followup(2, date(2024, 9, 1), date(2024, 12, 1), "Yes"));

        let library = DatimIndicatorLibrary::new();
        assert_eq!(run(&store, &library.newly_started_art_while_pregnant()), ids(&[1, 2]));
        assert_eq!(run(&store, &library.started_art_and_pregnant()), ids(&[2]));
    }

    // ===== TX_PVLS =====

    #[test]
    fn test_viral_load_uses_latest_result_in_window() {
        let store = InMemoryEventStore::new()
            .with_row(tables::DRUG_EVENT, drug_event(1, date(2020, 1, 1), None))
            .with_row(tables::DRUG_EVENT, drug_event(2, date(2020, 1, 1), None))
            .with_row(tables::DRUG_EVENT, drug_event(3, date(2020, 1, 1), None))
            .with_row(tables::DRUG_EVENT, drug_event(4, date(2020, 1, 1), None))
            // suppressed after an earlier high result
            .with_row(tables::LABORATORY, lab(1, date(2024, 1, 10), FieldValue::Int(5000), Some("Routine")))
            .with_row(tables::LABORATORY, lab(1, date(2024, 6, 10), "LDL".into(), Some("Routine")))
            // high latest result
            .with_row(tables::LABORATORY, lab(2, date(2024, 6, 10), FieldValue::Int(1000), Some("Routine")))
            // only result is outside the 12 month window
            .with_row(tables::LABORATORY, lab(3, date(2023, 9, 29), FieldValue::Int(20), Some("Routine")))
            // targeted
            .with_row(tables::LABORATORY, lab(4, date(2024, 2, 1), FieldValue::Int(20), Some("Targeted")));

        let library = DatimIndicatorLibrary::new();
        assert_eq!(
            run(&store, &library.on_art_with_viral_load(ViralLoadIndication::Routine, true)),
            ids(&[1])
        );
        assert_eq!(
            run(&store, &library.on_art_with_viral_load(ViralLoadIndication::Routine, false)),
            ids(&[1, 2])
        );
        assert_eq!(
            run(&store, &library.on_art_with_viral_load(ViralLoadIndication::Targeted, true)),
            ids(&[4])
        );
        assert!(run(&store, &library.on_art_with_viral_load(ViralLoadIndication::Undocumented, false)).is_empty());
    }

    #[test]
    fn test_pregnant_viral_load_reads_latest_followup() {
        let store = InMemoryEventStore::new()
            .with_row(tables::DRUG_EVENT, drug_event(1, date(2020, 1, 1), None))
            .with_row(tables::DRUG_EVENT, drug_event(2, date(2020, 1, 1), None))
            .with_row(tables::LABORATORY, lab(1, date(2024, 6, 10), FieldValue::Int(40), None))
            .with_row(tables::LABORATORY, lab(2, date(2024, 6, 10), FieldValue::Int(40), None))
            .with_row(tables::HIV_FOLLOWUP, followup(1, date(2024, 8, 1), date(2024, 11, 1), "Yes"))
            .with_row(tables::HIV_FOLLOWUP, followup(2, date(2024, 5, 1), date(2024, 6, 1), "Yes"))
            .with_row(tables::HIV_FOLLOWUP, followup(2, date(2024, 6, 1), date(2024, 11, 1), "No"));

        let indicator = DatimIndicatorLibrary::new()
            .pregnant_on_art_with_viral_load(ViralLoadIndication::Undocumented, true);
        assert_eq!(run(&store, &indicator), ids(&[1]));
    }

    // ===== TX_ML =====

    #[test]
    fn test_missed_appointment() {
        let store = InMemoryEventStore::new()
            .with_row(tables::DRUG_EVENT, drug_event(1, date(2020, 1, 1), None))
            .with_row(tables::DRUG_EVENT, drug_event(2, date(2020, 1, 1), None))
            .with_row(tables::DRUG_EVENT, drug_event(3, date(2020, 1, 1), None))
            // appointment in August, never came back
            .with_row(tables::HIV_FOLLOWUP, followup(1, date(2024, 5, 1), date(2024, 8, 1), "No"))
            // came back after the missed date
            .with_row(tables::HIV_FOLLOWUP, followup(2, date(2024, 5, 1), date(2024, 8, 1), "No"))
            .with_row(tables::HIV_FOLLOWUP, followup(2, date(2024, 8, 3), date(2024, 11, 3), "No"))
            // appointment due on the end date is not yet missed
            .with_row(tables::HIV_FOLLOWUP, followup(3, date(2024, 6, 30), date(2024, 9, 30), "No"));

        assert_eq!(run(&store, &DatimIndicatorLibrary::new().on_art_missed_appointment()), ids(&[1]));
    }

    // ===== HTS and PMTCT =====

    #[test]
    fn test_recent_infection_requires_adult() {
        let test = |patient: i64| {
            row([
                ("patient_id", FieldValue::Int(patient)),
                ("visit_date", date(2024, 8, 1).into()),
                ("final_test_result", "Positive".into()),
                ("recency_test_result", "Recent".into()),
                ("voided", FieldValue::Int(0)),
            ])
        };
        let store = InMemoryEventStore::new()
            .with_row(tables::HTS_TEST, test(1))
            .with_row(tables::HTS_TEST, test(2))
            .with_row(tables::DEMOGRAPHICS, row([("patient_id", FieldValue::Int(1)), ("dob", date(2009, 9, 30).into())]))
            .with_row(tables::DEMOGRAPHICS, row([("patient_id", FieldValue::Int(2)), ("dob", date(2009, 10, 1).into())]));

        assert_eq!(run(&store, &DatimIndicatorLibrary::new().recent_hiv_infections()), ids(&[1]));
    }

    #[test]
    fn test_hei_birth_cohort() {
        let hei = |patient: i64, status: Option<&str>, exit: Option<&str>| {
            row([
                ("patient_id", FieldValue::Int(patient)),
                ("final_hiv_status", status.into()),
                ("exit_reason", exit.into()),
                ("voided", FieldValue::Int(0)),
            ])
        };
        let born = |patient: i64, dob: NaiveDate| row([("patient_id", FieldValue::Int(patient)), ("dob", dob.into())]);
        let store = InMemoryEventStore::new()
            .with_row(tables::DEMOGRAPHICS, born(1, date(2022, 7, 1)))
            .with_row(tables::DEMOGRAPHICS, born(2, date(2022, 9, 30)))
            .with_row(tables::DEMOGRAPHICS, born(3, date(2022, 8, 15)))
            .with_row(tables::DEMOGRAPHICS, born(4, date(2022, 10, 1)))
            .with_row(tables::HEI_ENROLLMENT, hei(1, Some("Positive"), None))
            .with_row(tables::HEI_ENROLLMENT, hei(2, None, Some("Died")))
            .with_row(tables::HEI_ENROLLMENT, hei(3, None, None))
            .with_row(tables::HEI_ENROLLMENT, hei(4, Some("Negative"), None));

        let library = DatimIndicatorLibrary::new();
        assert_eq!(run(&store, &library.total_hei()), ids(&[1, 2, 3]));
        assert_eq!(run(&store, &library.hei_with_final_status("Positive")), ids(&[1]));
        assert!(run(&store, &library.hei_with_final_status("Negative")).is_empty());
        assert_eq!(run(&store, &library.hei_unknown_status()), ids(&[3]));
        assert_eq!(run(&store, &library.hei_died_status_unknown()), ids(&[2]));
    }

    #[test]
    fn test_voided_rows_never_count() {
        let store = InMemoryEventStore::new().with_row(
            tables::MCH_ENROLLMENT,
            row([
                ("patient_id", FieldValue::Int(1)),
                ("visit_date", date(2024, 8, 1).into()),
                ("voided", FieldValue::Int(1)),
            ]),
        );
        assert!(run(&store, &DatimIndicatorLibrary::new().clients_newly_enrolled_to_anc()).is_empty());
    }
}
