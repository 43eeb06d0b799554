//! Error codes following a structured numbering system
//!
//! Error code ranges:
//! - HC0100-HC0199: Configuration errors (catalog, parameters)
//! - HC0200-HC0299: Evaluation errors (patient calculations)
//! - HC0300-HC0399: Data errors (patient data source, data model)
//! - HC0400-HC0499: Query and report errors (cohort queries, datasets)
//! - HC0500-HC0599: System errors (I/O, formats)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HC{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Configuration errors (0100-0199)
    map.insert(100, ErrorInfo::new("Invalid metadata catalog"));
    map.insert(101, ErrorInfo::new("Missing parameter")
        .with_help("Supply the parameter on the command line or in the report context"));
    map.insert(102, ErrorInfo::new("Invalid parameter value"));
    map.insert(103, ErrorInfo::new("Unknown calculation"));
    map.insert(104, ErrorInfo::new("Unknown report"));

    // Evaluation errors (0200-0299)
    map.insert(200, ErrorInfo::new("Calculation failed"));
    map.insert(201, ErrorInfo::new("Delegated calculation failed"));

    // Data errors (0300-0399)
    map.insert(300, ErrorInfo::new("Patient data unavailable"));
    map.insert(301, ErrorInfo::new("Invalid patient data"));

    // Query and report errors (0400-0499)
    map.insert(400, ErrorInfo::new("Cohort query failed"));
    map.insert(401, ErrorInfo::new("Unknown table")
        .with_help("Check that the event table is loaded in the query store"));
    map.insert(402, ErrorInfo::new("Column type mismatch"));
    map.insert(403, ErrorInfo::new("Indicator evaluation failed"));
    map.insert(404, ErrorInfo::new("Unknown dimension"));
    map.insert(405, ErrorInfo::new("Invalid parameter mapping"));
    map.insert(406, ErrorInfo::new("Invalid dataset definition"));

    // System errors (0500-0599)
    map.insert(500, ErrorInfo::new("Internal error"));
    map.insert(501, ErrorInfo::new("I/O error"));
    map.insert(502, ErrorInfo::new("Invalid format"));

    map
});

// Configuration errors
pub const HC0100: ErrorCode = ErrorCode::new(100);
pub const HC0101: ErrorCode = ErrorCode::new(101);
pub const HC0102: ErrorCode = ErrorCode::new(102);
pub const HC0103: ErrorCode = ErrorCode::new(103);
pub const HC0104: ErrorCode = ErrorCode::new(104);

// Evaluation errors
pub const HC0200: ErrorCode = ErrorCode::new(200);
pub const HC0201: ErrorCode = ErrorCode::new(201);

// Data errors
pub const HC0300: ErrorCode = ErrorCode::new(300);
pub const HC0301: ErrorCode = ErrorCode::new(301);

// Query and report errors
pub const HC0400: ErrorCode = ErrorCode::new(400);
pub const HC0401: ErrorCode = ErrorCode::new(401);
pub const HC0402: ErrorCode = ErrorCode::new(402);
pub const HC0403: ErrorCode = ErrorCode::new(403);
pub const HC0404: ErrorCode = ErrorCode::new(404);
pub const HC0405: ErrorCode = ErrorCode::new(405);
pub const HC0406: ErrorCode = ErrorCode::new(406);

// System errors
pub const HC0500: ErrorCode = ErrorCode::new(500);
pub const HC0501: ErrorCode = ErrorCode::new(501);
pub const HC0502: ErrorCode = ErrorCode::new(502);
