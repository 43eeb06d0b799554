//! Metadata catalog
//!
//! Concept and program codes the calculations look up. A catalog is built
//! once per batch run and handed to every evaluation context; nothing here is
//! process-wide.

use crate::patient::ConceptCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// KenyaEMR HIV program identifier
pub const HIV_PROGRAM_UUID: &str = "dfdc6d40-2f2f-463d-ba90-cc97350441a8";

/// Read-only dictionary of the codes used by the calculation library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataCatalog {
    /// HIV care program
    pub hiv_program: String,
    /// HIV viral load (copies/ml)
    pub hiv_viral_load: ConceptCode,
    /// Pregnancy status question
    pub pregnancy_status: ConceptCode,
    /// Coded "yes" answer
    pub yes: ConceptCode,
    /// Body mass index
    pub bmi: ConceptCode,
    /// ART start date recorded at transfer-in
    pub art_start_date: ConceptCode,
    /// Drugs that count as antiretroviral therapy
    pub arv_drugs: BTreeSet<ConceptCode>,
}

impl Default for MetadataCatalog {
    fn default() -> Self {
        Self {
            hiv_program: HIV_PROGRAM_UUID.to_string(),
            hiv_viral_load: ConceptCode::ciel(856),
            pregnancy_status: ConceptCode::ciel(5272),
            yes: ConceptCode::ciel(1065),
            bmi: ConceptCode::ciel(1342),
            art_start_date: ConceptCode::ciel(159599),
            arv_drugs: [84795, 78643, 75523, 80586, 86663, 794]
                .into_iter()
                .map(ConceptCode::ciel)
                .collect(),
        }
    }
}

/// Catalog loading error
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(String),

    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

impl MetadataCatalog {
    /// Load a catalog from JSON; fields left out keep their defaults
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Reject catalogs with blank codes
    pub fn validate(&self) -> Result<(), CatalogError> {
        let named = [
            ("hiv_program", self.hiv_program.as_str()),
            ("hiv_viral_load", self.hiv_viral_load.as_str()),
            ("pregnancy_status", self.pregnancy_status.as_str()),
            ("yes", self.yes.as_str()),
            ("bmi", self.bmi.as_str()),
            ("art_start_date", self.art_start_date.as_str()),
        ];
        for (field, code) in named {
            if code.trim().is_empty() {
                return Err(CatalogError::Invalid(format!("{} must not be blank", field)));
            }
        }
        if self.arv_drugs.is_empty() {
            return Err(CatalogError::Invalid("arv_drugs must list at least one drug".to_string()));
        }
        Ok(())
    }

    pub fn is_arv(&self, drug: &ConceptCode) -> bool {
        self.arv_drugs.contains(drug)
    }
}

impl From<CatalogError> for hivcare_diagnostics::HivCareError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Io(_) => Self::system(hivcare_diagnostics::HC0501, err.to_string()),
            CatalogError::Parse(_) | CatalogError::Invalid(_) => {
                Self::configuration(hivcare_diagnostics::HC0100, err.to_string())
            }
        }
    }
}
