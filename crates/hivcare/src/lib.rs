//! HIV care decision support and indicator reporting for Rust
//!
//! This crate bundles the workspace crates behind one dependency:
//! - Patient data model and read-only data sources
//! - Per-patient clinical calculations and flags
//! - Declarative cohort indicators and the DATIM Q4 report
//! - Error codes and diagnostics
//!
//! # Example
//!
//! ```ignore
//! use hivcare::{CalculationContext, CalculationRegistry, InMemoryPatientStore, MetadataCatalog};
//!
//! let store = InMemoryPatientStore::from_json_file("patients.json")?;
//! let catalog = MetadataCatalog::default();
//! let ctx = CalculationContext::new(now, &catalog, &store);
//! let rule = CalculationRegistry::with_standard_library().require("needs-viral-load-test")?;
//! let results = rule.evaluate(&store.all_patient_ids()?, &ctx)?;
//! ```

// Re-export all public APIs from internal crates
pub use hivcare_calc as calc;
pub use hivcare_diagnostics as diagnostics;
pub use hivcare_model as model;
pub use hivcare_reporting as reporting;

// Convenience re-exports
pub use hivcare_calc::{CalculationContext, CalculationRegistry, CalculationResult, PatientCalculation};
pub use hivcare_diagnostics::{HivCareError, Result};
pub use hivcare_model::{Cohort, InMemoryPatientStore, MetadataCatalog, PatientDataSource, PatientId};
pub use hivcare_reporting::{InMemoryEventStore, ReportContext, ReportRegistry, ReportRunner};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
