//! Top-level error types

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An error message with its code, subject and help
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// What the diagnostic is about (a calculation, an indicator, a file)
    pub subject: Option<String>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            subject: None,
            help: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render with terminal colors
    #[cfg(feature = "colored")]
    pub fn to_colored_string(&self) -> String {
        use colored::Colorize;

        let head = format!("error[{}]", self.code).red().bold();
        let mut out = format!("{}: {}", head, self.message);
        if let Some(subject) = &self.subject {
            out.push_str(&format!(" ({})", subject.cyan()));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  {} {}", "help:".green(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} - {}", self.code, self.message)?;
        if let Some(subject) = &self.subject {
            write!(f, " ({})", subject)?;
        }
        Ok(())
    }
}

/// Main error type
///
/// Library crates keep their own error enums and convert into this type at
/// the boundary where a caller needs one error for everything.
#[derive(Debug, Clone, Error)]
pub enum HivCareError {
    /// Configuration error (catalog, parameters, lookups)
    #[error("{code}: {message}")]
    Configuration {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Calculation error
    #[error("{code}: {message}")]
    Evaluation {
        code: ErrorCode,
        message: String,
        calculation: Option<String>,
        context: Option<String>,
    },

    /// Patient data error
    #[error("{code}: {message}")]
    Data {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Cohort query or report error
    #[error("{code}: {message}")]
    Report {
        code: ErrorCode,
        message: String,
        indicator: Option<String>,
        context: Option<String>,
    },

    /// System error
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },
}

impl HivCareError {
    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn evaluation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Evaluation {
            code,
            message: message.into(),
            calculation: None,
            context: None,
        }
    }

    pub fn data(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Data {
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn report(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Report {
            code,
            message: message.into(),
            indicator: None,
            context: None,
        }
    }

    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Name the calculation an evaluation error came from
    pub fn for_calculation(mut self, name: impl Into<String>) -> Self {
        if let Self::Evaluation { calculation, .. } = &mut self {
            *calculation = Some(name.into());
        }
        self
    }

    /// Name the indicator a report error came from
    pub fn for_indicator(mut self, name: impl Into<String>) -> Self {
        if let Self::Report { indicator, .. } = &mut self {
            *indicator = Some(name.into());
        }
        self
    }

    /// Attach context to any variant
    pub fn with_context(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Self::Configuration { context, .. }
            | Self::Evaluation { context, .. }
            | Self::Data { context, .. }
            | Self::Report { context, .. }
            | Self::System { context, .. } => *context = Some(text.into()),
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { code, .. } => *code,
            Self::Evaluation { code, .. } => *code,
            Self::Data { code, .. } => *code,
            Self::Report { code, .. } => *code,
            Self::System { code, .. } => *code,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Configuration { code, message, context }
            | Self::Data { code, message, context }
            | Self::System { code, message, context } => {
                with_help(Diagnostic::error(*code, message.clone()), *code, context)
            }
            Self::Evaluation { code, message, calculation, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(name) = calculation {
                    diag = diag.with_subject(name.clone());
                }
                with_help(diag, *code, context)
            }
            Self::Report { code, message, indicator, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(name) = indicator {
                    diag = diag.with_subject(name.clone());
                }
                with_help(diag, *code, context)
            }
        }
    }
}

fn with_help(diag: Diagnostic, code: ErrorCode, context: &Option<String>) -> Diagnostic {
    match (context, code.info().help) {
        (Some(ctx), _) => diag.with_help(ctx.clone()),
        (None, Some(help)) => diag.with_help(help),
        (None, None) => diag,
    }
}
