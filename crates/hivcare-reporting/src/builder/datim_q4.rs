//! DATIM quarterly care and treatment report

use crate::dataset::{CohortIndicator, CohortIndicatorDataSetDefinition, ColumnParameters, Parameter};
use crate::error::ReportError;
use crate::evaluator::{END_DATE, START_DATE};
use crate::library::{DatimIndicatorLibrary, ViralLoadIndication, datim_fine_age_groups, gender};
use crate::mapped::Mapped;
use crate::report::{ReportBuilder, ReportDefinition};
use std::sync::Arc;

/// Mapping from the dataset's reporting period to each indicator
const PERIOD: &str = "startDate=${startDate},endDate=${endDate}";

#[derive(Debug, Clone, Default)]
pub struct DatimQ4ReportBuilder {
    indicators: DatimIndicatorLibrary,
}

impl DatimQ4ReportBuilder {
    pub const ID: &'static str = "hivcare.etl.common.report.datimQ4";
    pub const DATASET: &'static str = "3";

    pub fn new() -> Self {
        Self::default()
    }

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::date(START_DATE, "Start Date"),
            Parameter::date(END_DATE, "End Date"),
            Parameter::text("dateBasedReporting", ""),
        ]
    }

    /// Section 3: care and treatment
    pub fn care_and_treatment_dataset(&self) -> Result<CohortIndicatorDataSetDefinition, ReportError> {
        let lib = &self.indicators;
        let mut dsd = CohortIndicatorDataSetDefinition::new(Self::DATASET);
        dsd.add_parameter(Parameter::date(START_DATE, "Start Date"));
        dsd.add_parameter(Parameter::date(END_DATE, "End Date"));
        dsd.add_dimension("age", Mapped::parse(Arc::new(datim_fine_age_groups()?), "onDate=${endDate}")?);
        dsd.add_dimension("gender", Mapped::parse(Arc::new(gender()?), "")?);

        let new_age = new_age_disaggregation();
        let anc = pmtct_anc_age_disaggregation();
        let months = infant_months_disaggregation();
        let new_age_codes = codes(new_age.len());
        let anc_codes = codes(anc.len());
        let month_codes = codes(months.len());

        dsd.add_column(
            "TX_New_TB_co_infected",
            "Started on ART and TB co-infected",
            map(lib.started_art_and_tb_coinfected())?,
            "",
        )?;
        dsd.add_column(
            "TX_New_pregnant",
            "Started on ART and pregnant",
            map(lib.started_art_and_pregnant())?,
            "",
        )?;

        // ANC testing and PMTCT
        let anc_rows = [
            ("HTC_TST_Negative", "Clients tested HIV Negative at ANC", lib.tested_at("ANC", "Negative")),
            ("HTC_TST_Positive", "Clients tested HIV Positive at ANC", lib.tested_at("ANC", "Positive")),
            (
                "PMTCT_STA_Numerator",
                "Clients with Known HIV status at ANC",
                lib.clients_with_known_hiv_status_at_anc(),
            ),
            ("PMTCT_STA_Denominator", "Clients newly enrolled to ANC", lib.clients_newly_enrolled_to_anc()),
        ];
        for (key, label, indicator) in anc_rows {
            dsd.add_row(key, label, map(indicator)?, &anc, &anc_codes)?;
        }

        let eid_rows = [
            ("PMTCT_EID_Negative", "Infants tested Negative for Virology", Some("Negative")),
            ("PMTCT_EID_Positive", "Infants tested Positive for Virology", Some("Positive")),
            ("PMTCT_EID_No_Results", "Infants tested for Virology with no results", None),
        ];
        for (key, label, result) in eid_rows {
            dsd.add_row(key, label, map(lib.infants_tested_for_virology(result))?, &months, &month_codes)?;
        }

        dsd.add_row(
            "PMTCT_ART_Already",
            "Number of Mothers Already on ART at the start of current Pregnancy",
            map(lib.mothers_already_on_art())?,
            &anc,
            &anc_codes,
        )?;
        dsd.add_row(
            "PMTCT_ART_New",
            "Mothers new on ART during current pregnancy",
            map(lib.mothers_new_on_art())?,
            &anc,
            &anc_codes,
        )?;

        // Provider initiated testing by entry point
        for result in ["Negative", "Positive"] {
            dsd.add_row(
                &format!("HTC_TST_Inpatient_{}", result),
                &format!("Tested {} at PITC Inpatient Services", result),
                map(lib.tested_at("Inpatient", result))?,
                &new_age,
                &new_age_codes,
            )?;
        }
        for (service, entry_point, label) in [
            ("Paediatric", "Paediatric", "PITC Paediatric services"),
            ("Malnutrition", "Malnutrition", "PITC Malnutrition Clinic"),
        ] {
            for result in ["Negative", "Positive"] {
                dsd.add_column(
                    format!("HTC_TST_{}_{}", service, result),
                    format!("Tested {} at {}", result, label),
                    map(lib.tested_at(entry_point, result))?,
                    "",
                )?;
            }
        }
        for (service, entry_point, label) in [
            ("TB", "TB", "PITC TB Clinic"),
            ("Other", "Other", "PITC Other"),
            ("VCT", "VCT", "PITC VCT"),
            ("Index", "Index", "Index"),
        ] {
            for result in ["Negative", "Positive"] {
                let label = if service == "Index" {
                    format!("Index Tested {}", result)
                } else {
                    format!("Tested {} at {}", result, label)
                };
                dsd.add_row(
                    &format!("HTC_TST_{}_{}", service, result),
                    &label,
                    map(lib.tested_at(entry_point, result))?,
                    &new_age,
                    &new_age_codes,
                )?;
            }
        }

        // TX_NEW
        dsd.add_column(
            "TX_New_Pregnant",
            "Newly Started ART While Pregnant",
            map(lib.newly_started_art_while_pregnant())?,
            "",
        )?;
        dsd.add_column(
            "TX_New_BF",
            "Newly Started ART While Breastfeeding",
            map(lib.newly_started_art_while_breastfeeding())?,
            "",
        )?;
        dsd.add_column("TX_New_TB", "Newly Started ART with TB", map(lib.newly_started_art_with_tb())?, "")?;
        dsd.add_row(
            "TX_New_Sex_Age",
            "Newly Started ART Disaggregated by Age / Sex",
            map(lib.newly_started_art())?,
            &new_age,
            &new_age_codes,
        )?;

        // PMTCT_FO annual birth cohort
        dsd.add_column("PMTCT_FO_HEI_COHORT", "HEI Cohort", map(lib.total_hei())?, "")?;
        dsd.add_column(
            "PMTCT_FO_INFECTED_HEI",
            "HEI Cohort HIV+",
            map(lib.hei_with_final_status("Positive"))?,
            "",
        )?;
        dsd.add_column(
            "PMTCT_FO_UNINFECTED_HEI",
            "HEI Cohort HIV-",
            map(lib.hei_with_final_status("Negative"))?,
            "",
        )?;
        dsd.add_column(
            "PMTCT_FO_HEI_UNKNOWN_HIV_STATUS",
            "HEI Cohort with unknown HIV Status",
            map(lib.hei_unknown_status())?,
            "",
        )?;
        dsd.add_column(
            "PMTCT_FO_HEI_DIED_HIV_STATUS_UNKNOWN",
            "HEI died with unknown HIV Status",
            map(lib.hei_died_status_unknown())?,
            "",
        )?;

        // TX_PVLS numerator then denominator
        for (suppressed, kind) in [(true, "SUPP"), (false, "DENOMINATOR")] {
            let indications = [
                ("ROUTINE", ViralLoadIndication::Routine),
                ("TARGETED", ViralLoadIndication::Targeted),
                ("UNDOCUMENTED", ViralLoadIndication::Undocumented),
            ];
            let mut by_indication = Vec::with_capacity(indications.len());
            for (name, indication) in indications {
                let all = lib.on_art_with_viral_load(indication, suppressed);
                dsd.add_column(
                    format!("TX_PVLS_{}_{}_ALL", kind, name),
                    viral_load_label(suppressed, &format!("{} Test", title_case(name))),
                    map(all.clone())?,
                    "",
                )?;
                by_indication.push((name, indication, all));
            }
            for (status, status_label) in [("PREGNANT", "Pregnant"), ("BF", "BF")] {
                for (name, indication, _) in &by_indication {
                    let indicator = if status == "PREGNANT" {
                        lib.pregnant_on_art_with_viral_load(*indication, suppressed)
                    } else {
                        lib.breastfeeding_on_art_with_viral_load(*indication, suppressed)
                    };
                    dsd.add_column(
                        format!("TX_PVLS_{}_{}_{}", kind, status, name),
                        viral_load_label(suppressed, &format!("{} {}", status_label, title_case(name))),
                        map(indicator)?,
                        "",
                    )?;
                }
            }
            for (name, _, all) in by_indication {
                dsd.add_row(
                    &format!("TX_PVLS_{}_{}", kind, name),
                    &viral_load_label(suppressed, &format!("{} by Age / Sex", title_case(name))),
                    map(all)?,
                    &new_age,
                    &new_age_codes,
                )?;
            }
        }

        dsd.add_row(
            "TX_ML",
            "Number of ART patients with no clinical contact since their last expected contact",
            map(lib.on_art_missed_appointment())?,
            &new_age,
            &new_age_codes,
        )?;
        dsd.add_row(
            "HTS_INDEX",
            "No. of individuals identified and tested & received results using Index testing services",
            map(lib.tested_through_index_services())?,
            &new_age,
            &new_age_codes,
        )?;
        dsd.add_row(
            "HTS_RECENT",
            "Persons aged 15+ years newly diagnosed with HIV-1 infection who have a test for recent infection",
            map(lib.recent_hiv_infections())?,
            &new_age,
            &new_age_codes,
        )?;

        log::debug!("Built dataset '{}' with {} columns", dsd.name(), dsd.column_count());
        Ok(dsd)
    }
}

impl ReportBuilder for DatimQ4ReportBuilder {
    fn id(&self) -> &str {
        Self::ID
    }

    fn build(&self) -> Result<ReportDefinition, ReportError> {
        let mut report = ReportDefinition::new(Self::ID, "DATIM Q4");
        report.description = "DATIM quarterly care and treatment indicators".to_string();
        report.parameters = Self::parameters();
        report
            .datasets
            .push(Mapped::parse(Arc::new(self.care_and_treatment_dataset()?), PERIOD)?);
        Ok(report)
    }
}

fn map(indicator: Arc<CohortIndicator>) -> Result<Mapped<CohortIndicator>, ReportError> {
    Mapped::parse(indicator, PERIOD)
}

/// Two-digit column codes `01..=n`
fn codes(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{:02}", i)).collect()
}

fn title_case(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn viral_load_label(suppressed: bool, detail: &str) -> String {
    if suppressed {
        format!(
            "Number of patients on ART with suppressed viral load results (<1,000 copies/ml) {}",
            detail
        )
    } else {
        format!("Number of patients on ART with viral load results {}", detail)
    }
}

const AGE_BANDS: [&str; 12] = [
    "<1", "1-4", "5-9", "10-14", "15-19", "20-24", "25-29", "30-34", "35-39", "40-44", "45-49", "50+",
];

/// Female then male for each fine age band
fn new_age_disaggregation() -> Vec<ColumnParameters> {
    AGE_BANDS
        .iter()
        .flat_map(|band| {
            [("F", "Female"), ("M", "Male")].map(|(code, sex)| {
                ColumnParameters::new(format!("{}, {}", band, sex), format!("gender={}|age={}", code, band))
            })
        })
        .collect()
}

/// Women by the ANC age bands
fn pmtct_anc_age_disaggregation() -> Vec<ColumnParameters> {
    ["<10", "10-14", "15-19", "20-24", "25-29", "30-34", "35-39", "40-44", "45-49", "50+"]
        .iter()
        .map(|band| ColumnParameters::new(format!("{}, Female", band), format!("gender=F|age={}", band)))
        .collect()
}

/// Infants by age in months
fn infant_months_disaggregation() -> Vec<ColumnParameters> {
    ["0-2", "2-12"]
        .iter()
        .map(|band| ColumnParameters::new(*band, format!("age={}", band)))
        .collect()
}
