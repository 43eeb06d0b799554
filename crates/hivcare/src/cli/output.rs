//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use hivcare_diagnostics::HivCareError;
use serde::Serialize;
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    #[default]
    Pretty,
    /// Text table
    Table,
}

/// Color output options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Set up color output based on user preference
pub fn setup_colors(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => colored::control::set_override(io::stdout().is_terminal()),
    }
}

/// Format an error for display
///
/// Library errors anywhere in the chain are rendered as coded diagnostics
/// below the top-level message.
pub fn format_error(error: &anyhow::Error) -> String {
    let mut out = format!("{} {}", "Error:".red().bold(), error);
    if let Some(err) = error.chain().find_map(|e| e.downcast_ref::<HivCareError>()) {
        out.push_str("\n  ");
        out.push_str(&err.to_diagnostic().to_colored_string());
    }
    out
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!(
            "{}",
            format_success(&format!("Output written to {}", path.display()))
        );
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Serialize a value as JSON
pub fn format_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    } else {
        serde_json::to_string(value).context("Failed to serialize JSON")
    }
}

/// Render rows as a text table
pub fn format_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows).with(Style::modern()).to_string()
}

/// Print a command result in the requested format
///
/// `document` is what the JSON formats serialize; `rows` is the flattened
/// view used by the table format.
pub fn print_output<T, R>(document: &T, rows: &[R], format: OutputFormat, output_file: Option<&Path>) -> Result<()>
where
    T: Serialize + ?Sized,
    R: Tabled,
{
    let content = match format {
        OutputFormat::Json => format_json(document, false)?,
        OutputFormat::Pretty => format_json(document, true)?,
        OutputFormat::Table => format_table(rows),
    };

    write_output(&content, output_file)
}
