//! In-memory patient store tests

use chrono::{NaiveDate, NaiveDateTime};
use hivcare_model::{
    Cohort, ConceptCode, DataSourceError, DrugOrder, InMemoryPatientStore, Observation, Patient,
    PatientDataSource, PatientId, ProgramEnrollment, Sex,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn vl() -> ConceptCode {
    ConceptCode::ciel(856)
}

#[test]
fn test_observations_sorted_and_restricted_to_cohort() {
    let store = InMemoryPatientStore::new()
        .with_patient(Patient::new(1, Sex::Female))
        .with_patient(Patient::new(2, Sex::Male))
        .with_observation(Observation::numeric(1, vl(), 400, at(2024, 3, 1)))
        .with_observation(Observation::numeric(1, vl(), 1500, at(2023, 3, 1)))
        .with_observation(Observation::numeric(2, vl(), 20, at(2024, 1, 1)))
        .with_observation(Observation::numeric(1, ConceptCode::ciel(1342), 22, at(2024, 1, 1)));

    let cohort: Cohort = [1u32].into_iter().collect();
    let obs = store.observations(&vl(), &cohort).unwrap();

    assert_eq!(obs.len(), 1);
    let values: Vec<Option<Decimal>> = obs[&PatientId(1)].iter().map(|o| o.value_numeric()).collect();
    assert_eq!(values, vec![Some(Decimal::from(1500)), Some(Decimal::from(400))]);
}

#[test]
fn test_enrollments_filtered_by_program() {
    let store = InMemoryPatientStore::new()
        .with_patient(Patient::new(1, Sex::Female))
        .with_enrollment(ProgramEnrollment::new(1, "hiv", at(2020, 1, 1)))
        .with_enrollment(ProgramEnrollment::new(1, "tb", at(2021, 1, 1)));

    let cohort = store.all_patient_ids().unwrap();
    let enrollments = store.enrollments("hiv", &cohort).unwrap();
    assert_eq!(enrollments[&PatientId(1)].len(), 1);
    assert_eq!(enrollments[&PatientId(1)][0].program, "hiv");
}

#[test]
fn test_add_patient_replaces_existing() {
    let mut store = InMemoryPatientStore::new();
    store.add_patient(Patient::new(1, Sex::Unknown));
    store.add_patient(Patient::new(1, Sex::Male));

    let patients = store.patients(&store.all_patient_ids().unwrap()).unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].sex, Sex::Male);
}

#[test]
fn test_from_json() {
    let json = r#"{
        "patients": [{"id": 1, "sex": "F", "birthdate": "1990-04-01"}, {"id": 2, "sex": "M", "dead": true}],
        "observations": [
            {"patient": 1, "concept": "856", "value": {"numeric": "1500"}, "obs_datetime": "2024-01-10T09:00:00"},
            {"patient": 1, "concept": "856", "obs_datetime": "2024-02-10T09:00:00"}
        ],
        "drug_orders": [{"patient": 1, "drug": "84795", "date_activated": "2020-02-01T00:00:00"}]
    }"#;

    let store = InMemoryPatientStore::from_json(json).unwrap();
    let cohort = store.all_patient_ids().unwrap();
    assert_eq!(cohort.len(), 2);

    let obs = store.observations(&ConceptCode::new("856"), &cohort).unwrap();
    assert_eq!(obs[&PatientId(1)][1].value, None);

    let orders = store.drug_orders(&cohort).unwrap();
    assert_eq!(orders[&PatientId(1)], vec![DrugOrder::new(1, ConceptCode::new("84795"), at(2020, 2, 1))]);

    let patients = store.patients(&cohort).unwrap();
    assert!(patients[1].dead);
}

#[test]
fn test_from_json_rejects_orphan_records() {
    let json = r#"{
        "patients": [{"id": 1}],
        "observations": [{"patient": 9, "concept": "856", "obs_datetime": "2024-01-10T09:00:00"}]
    }"#;

    let err = InMemoryPatientStore::from_json(json).unwrap_err();
    assert!(matches!(err, DataSourceError::InvalidData(msg) if msg.contains("unknown patient 9")));
}

#[test]
fn test_from_json_rejects_malformed_document() {
    let err = InMemoryPatientStore::from_json("{ not json").unwrap_err();
    assert!(matches!(err, DataSourceError::InvalidData(_)));
}
