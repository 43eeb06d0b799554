//! HIV care data model
//!
//! This crate provides:
//! - Patient, observation, program enrollment and drug order types
//! - Cohorts (ordered sets of patient identifiers)
//! - The metadata catalog of concept and program codes
//! - The read-only patient data source trait
//! - An in-memory data source used by tests and the command-line tool

pub mod catalog;
pub mod cohort;
pub mod memory;
pub mod patient;
pub mod provider;

pub use catalog::*;
pub use cohort::*;
pub use memory::*;
pub use patient::*;
pub use provider::*;
