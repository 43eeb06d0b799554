//! DATIM Q4 Report Tests
//!
//! Tests for: DatimQ4ReportBuilder layout, ReportRunner parameter checks,
//! per-run indicator sharing, failure propagation, counts over sample data

use chrono::NaiveDate;
use hivcare_model::Cohort;
use hivcare_reporting::{
    CohortDefinition, CohortIndicator, CohortIndicatorDataSetDefinition, CohortQuery, DataSetEvaluator,
    DatimQ4ReportBuilder, ETL_TABLES, FieldValue, InMemoryEventStore, Mapped, Predicate, QueryCohortDefinition,
    QueryError, QueryExecutor, ReportBuilder, ReportContext, ReportDefinition, ReportError, ReportRunner, Row,
};
use hivcare_reporting::query::row;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn report() -> ReportDefinition {
    DatimQ4ReportBuilder::new().build().unwrap()
}

fn quarter() -> ReportContext {
    ReportContext::new(date(2024, 10, 15))
        .with_parameter("startDate", date(2024, 7, 1))
        .with_parameter("endDate", date(2024, 9, 30))
}

fn empty_store() -> InMemoryEventStore {
    ETL_TABLES
        .iter()
        .fold(InMemoryEventStore::new(), |store, table| store.with_table(*table))
}

fn person(id: i64, gender: &str, dob: NaiveDate) -> Row {
    row([
        ("patient_id", FieldValue::Int(id)),
        ("gender", gender.into()),
        ("dob", dob.into()),
    ])
}

/// Records every query and answers with an empty cohort
#[derive(Default)]
struct RecordingExecutor {
    queries: Mutex<Vec<CohortQuery>>,
}

impl QueryExecutor for RecordingExecutor {
    fn execute(&self, query: &CohortQuery, _ctx: &ReportContext) -> Result<Cohort, QueryError> {
        self.queries.lock().push(query.clone());
        Ok(Cohort::new())
    }
}

/// Fails every query
struct FailingExecutor;

impl QueryExecutor for FailingExecutor {
    fn execute(&self, _query: &CohortQuery, _ctx: &ReportContext) -> Result<Cohort, QueryError> {
        Err(QueryError::Execution("connection lost".to_string()))
    }
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_report_parameters_and_dataset() {
    let report = report();
    assert_eq!(report.id, "hivcare.etl.common.report.datimQ4");
    assert_eq!(
        report.parameters.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["startDate", "endDate", "dateBasedReporting"]
    );
    assert_eq!(report.datasets.len(), 1);

    let dataset = report.dataset("3").unwrap();
    assert_eq!(dataset.mapping.to_string(), "startDate=${startDate},endDate=${endDate}");
    assert_eq!(
        dataset.definition.dimension("age").unwrap().mapping.to_string(),
        "onDate=${endDate}"
    );
    assert!(dataset.definition.dimension("gender").unwrap().mapping.is_empty());
}

#[test]
fn test_row_columns_are_coded_and_labelled() {
    let report = report();
    let dataset = &report.dataset("3").unwrap().definition;

    let first = dataset.column("HTC_TST_Inpatient_Negative-01").unwrap();
    assert_eq!(first.label, "Tested Negative at PITC Inpatient Services (<1, Female)");
    assert_eq!(first.dimensions_label(), "gender=F|age=<1");

    let last = dataset.column("TX_ML-24").unwrap();
    assert_eq!(last.dimensions_label(), "gender=M|age=50+");
    assert!(dataset.column("TX_ML-25").is_none());

    let anc = dataset.column("PMTCT_STA_Numerator-01").unwrap();
    assert_eq!(anc.dimensions_label(), "gender=F|age=<10");
    assert!(dataset.column("PMTCT_STA_Numerator-11").is_none());

    let months = dataset.column("PMTCT_EID_No_Results-02").unwrap();
    assert_eq!(months.dimensions_label(), "age=2-12");

    let total = dataset.column("TX_PVLS_SUPP_BF_UNDOCUMENTED").unwrap();
    assert!(total.dimension_options.is_empty());
}

#[test]
fn test_column_order_and_count() {
    let report = report();
    let dataset = &report.dataset("3").unwrap().definition;
    let names: Vec<&str> = dataset.columns().map(|c| c.name.as_str()).collect();

    assert_eq!(&names[..3], &["TX_New_TB_co_infected", "TX_New_pregnant", "HTC_TST_Negative-01"]);
    assert_eq!(names.last().copied(), Some("HTS_RECENT-24"));

    // 32 single columns, 6 ANC rows of 10, 3 infant rows of 2 and 20 rows of 24
    assert_eq!(dataset.column_count(), 32 + 6 * 10 + 3 * 2 + 20 * 24);
}

// ============================================================================
// Parameter Validation
// ============================================================================

#[test]
fn test_missing_end_date() {
    let ctx = ReportContext::new(date(2024, 10, 15)).with_parameter("startDate", date(2024, 7, 1));
    let err = ReportRunner::new(&empty_store()).run(&report(), &ctx).unwrap_err();
    assert_eq!(err, ReportError::missing_parameter("endDate"));
}

#[test]
fn test_reversed_period() {
    let ctx = ReportContext::new(date(2024, 10, 15))
        .with_parameter("startDate", date(2024, 10, 1))
        .with_parameter("endDate", date(2024, 9, 30));
    let err = ReportRunner::new(&empty_store()).run(&report(), &ctx).unwrap_err();
    assert!(matches!(err, ReportError::InvalidParameter { ref name, .. } if name == "startDate"));
}

#[test]
fn test_text_dates_are_accepted() {
    let ctx = ReportContext::new(date(2024, 10, 15))
        .with_parameter("startDate", "2024-07-01")
        .with_parameter("endDate", "2024-09-30");
    assert!(ReportRunner::new(&empty_store()).run(&report(), &ctx).is_ok());
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_empty_tables_give_zero_counts() {
    let data = ReportRunner::new(&empty_store()).run(&report(), &quarter()).unwrap();
    let dataset = data.dataset("3").unwrap();
    assert_eq!(dataset.len(), report().dataset("3").unwrap().definition.column_count());
    assert!(dataset.values.iter().all(|v| v.count == 0));
}

#[test]
fn test_each_indicator_queried_once_per_run() {
    let executor = RecordingExecutor::default();
    ReportRunner::new(&executor).run(&report(), &quarter()).unwrap();

    let queries = executor.queries.lock();
    // one query per distinct indicator plus one per dimension option in use
    assert!(queries.len() < 100, "{} queries", queries.len());
    let newly_started = queries
        .iter()
        .filter(|q| matches!(q, CohortQuery::Difference(..)))
        .count();
    assert_eq!(newly_started, 1);
}

#[test]
fn test_indicators_sharing_a_name_are_counted_separately() {
    let by_gender = |gender: &str| {
        let definition: Arc<dyn CohortDefinition> = Arc::new(QueryCohortDefinition::new(
            format!("gender-{}", gender),
            CohortQuery::select("etl_patient_demographics", Predicate::eq("gender", gender)),
        ));
        let indicator = CohortIndicator::new("tx-new", Mapped::parse(definition, "").unwrap());
        Mapped::parse(Arc::new(indicator), "").unwrap()
    };
    let mut dsd = CohortIndicatorDataSetDefinition::new("custom");
    dsd.add_column("female", "Female", by_gender("F"), "").unwrap();
    dsd.add_column("male", "Male", by_gender("M"), "").unwrap();

    let store = InMemoryEventStore::new()
        .with_row("etl_patient_demographics", person(1, "F", date(1990, 1, 1)))
        .with_row("etl_patient_demographics", person(2, "M", date(1990, 1, 1)))
        .with_row("etl_patient_demographics", person(3, "M", date(1990, 1, 1)));

    let dataset = DataSetEvaluator::new(&store).evaluate(&dsd, &quarter()).unwrap();
    assert_eq!(dataset.get("female"), Some(1));
    assert_eq!(dataset.get("male"), Some(2));
}

#[test]
fn test_failing_query_aborts_report() {
    let err = ReportRunner::new(&FailingExecutor).run(&report(), &quarter()).unwrap_err();
    match err {
        ReportError::Indicator { indicator, source } => {
            assert_eq!(indicator, "tx-new-tb-coinfected");
            assert_eq!(*source, ReportError::Query(QueryError::Execution("connection lost".to_string())));
        }
        other => panic!("expected indicator failure, got {:?}", other),
    }
}

#[test]
fn test_missing_table_aborts_report() {
    let store = ETL_TABLES
        .iter()
        .filter(|t| **t != "etl_hei_enrollment")
        .fold(InMemoryEventStore::new(), |s, t| s.with_table(*t));
    let err = ReportRunner::new(&store).run(&report(), &quarter()).unwrap_err();
    assert!(matches!(err, ReportError::Indicator { .. }));
    assert!(err.to_string().contains("etl_hei_enrollment"));
}

#[test]
fn test_counts_over_sample_data() {
    let mut store = empty_store();
    store.add_row("etl_patient_demographics", person(1, "F", date(1990, 3, 1)));
    store.add_row("etl_patient_demographics", person(2, "M", date(2012, 1, 1)));
    store.add_row("etl_patient_demographics", person(3, "F", date(2000, 5, 5)));
    for (patient, started) in [(1, date(2024, 8, 10)), (2, date(2024, 9, 1)), (3, date(2019, 1, 1))] {
        store.add_row(
            "etl_drug_event",
            row([
                ("patient_id", FieldValue::Int(patient)),
                ("program", "HIV".into()),
                ("date_started", started.into()),
                ("voided", FieldValue::Int(0)),
            ]),
        );
    }
    store.add_row(
        "etl_hiv_followup",
        row([
            ("patient_id", FieldValue::Int(1)),
            ("visit_date", date(2024, 8, 10).into()),
            ("next_appointment_date", date(2024, 11, 10).into()),
            ("pregnancy_status", "Yes".into()),
            ("voided", FieldValue::Int(0)),
        ]),
    );
    store.add_row(
        "etl_hts_test",
        row([
            ("patient_id", FieldValue::Int(1)),
            ("visit_date", date(2024, 8, 1).into()),
            ("test_type", FieldValue::Int(2)),
            ("final_test_result", "Positive".into()),
            ("hts_entry_point", "VCT".into()),
            ("voided", FieldValue::Int(0)),
        ]),
    );

    let data = ReportRunner::new(&store).run(&report(), &quarter()).unwrap();
    let dataset = data.dataset("3").unwrap();

    // 34 year old woman and 12 year old boy newly started
    assert_eq!(dataset.get("TX_New_Sex_Age-15"), Some(1));
    assert_eq!(dataset.get("TX_New_Sex_Age-08"), Some(1));
    assert_eq!(dataset.get("TX_New_Sex_Age-19"), Some(0));
    assert_eq!(dataset.get("TX_New_Pregnant"), Some(1));
    assert_eq!(dataset.get("TX_New_pregnant"), Some(1));
    assert_eq!(dataset.get("TX_New_BF"), Some(0));
    assert_eq!(dataset.get("HTC_TST_VCT_Positive-15"), Some(1));
    assert_eq!(dataset.get("HTC_TST_VCT_Negative-15"), Some(0));
    assert_eq!(data.context, quarter());
}
