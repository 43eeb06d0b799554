//! Patient Calculation Engine
//!
//! This crate evaluates clinical rules for a whole cohort of patients at once
//! against a read-only [`PatientDataSource`](hivcare_model::PatientDataSource).
//!
//! - **Context**: reference time, metadata catalog, data source, parameters
//! - **Results**: one [`CalculationResult`] per patient, collected in a
//!   [`CalculationResultMap`]
//! - **Helpers**: calendar arithmetic, cohort filters, observation lookups
//! - **Library**: ART status, viral load alert, values anchored on a date
//!
//! # Example
//!
//! ```ignore
//! use hivcare_calc::{CalculationContext, NeedsViralLoadTestCalculation, PatientCalculation};
//!
//! let ctx = CalculationContext::new(now, &catalog, &store);
//! let cohort = store.all_patient_ids()?;
//! let results = NeedsViralLoadTestCalculation::new().evaluate(&cohort, &ctx)?;
//! for (patient, result) in results.iter() {
//!     println!("{}: {}", patient, result);
//! }
//! ```
//!
//! # Unknown values
//!
//! Missing data never raises an error. A patient without the observations a
//! rule needs simply does not meet the condition, and a result read as the
//! wrong kind counts as unknown rather than true or false.

pub mod calculation;
pub mod calculations;
pub mod context;
pub mod dates;
pub mod error;
pub mod filters;
pub mod library;
pub mod registry;
pub mod value;

pub use calculation::{PatientCalculation, PatientFlagCalculation};
pub use context::CalculationContext;
pub use error::{EvalError, EvalResult};
pub use library::*;
pub use registry::CalculationRegistry;
pub use value::{CalculationResult, CalculationResultMap};
