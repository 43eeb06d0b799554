//! Built-in dimensions and indicators over the ETL event tables

pub mod datim;
pub mod dimensions;

pub use datim::{DatimIndicatorLibrary, ViralLoadIndication};
pub use dimensions::{datim_fine_age_groups, gender};

/// ETL table names
pub mod tables {
    pub const DEMOGRAPHICS: &str = "etl_patient_demographics";
    pub const HTS_TEST: &str = "etl_hts_test";
    pub const HTS_LINKAGE: &str = "etl_hts_referral_and_linkage";
    pub const DRUG_EVENT: &str = "etl_drug_event";
    pub const LABORATORY: &str = "etl_laboratory_extract";
    pub const MCH_ENROLLMENT: &str = "etl_mch_enrollment";
    pub const HIV_FOLLOWUP: &str = "etl_hiv_followup";
    pub const HEI_ENROLLMENT: &str = "etl_hei_enrollment";
}

/// Every table the built-in definitions read
pub const ETL_TABLES: [&str; 8] = [
    tables::DEMOGRAPHICS,
    tables::HTS_TEST,
    tables::HTS_LINKAGE,
    tables::DRUG_EVENT,
    tables::LABORATORY,
    tables::MCH_ENROLLMENT,
    tables::HIV_FOLLOWUP,
    tables::HEI_ENROLLMENT,
];
