//! Diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by the
//! calculation and reporting crates: structured error codes, a top-level
//! error type every library error converts into, and diagnostic reporting.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for HIV care operations
pub type Result<T> = std::result::Result<T, HivCareError>;
