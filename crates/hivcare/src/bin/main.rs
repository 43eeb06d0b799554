//! hivcare command-line interface

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use hivcare::cli::output::{ColorMode, OutputFormat};
use hivcare::cli::{calculate, columns, flags, input, output, report};
use hivcare::reporting::DatimQ4ReportBuilder;
use std::path::PathBuf;

/// HIV care command-line tool
#[derive(Parser)]
#[command(name = "hivcare")]
#[command(author, version, about = "HIV care calculations and indicator reports", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a calculation for every patient
    Calculate {
        /// Calculation name (e.g. needs-viral-load-test)
        rule: String,

        /// Patient data file (JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Reference time (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        #[arg(short, long, value_parser = input::parse_datetime)]
        now: NaiveDateTime,

        /// Metadata catalog file (JSON)
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Parameters (name=value)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },

    /// List patients with raised flags
    Flags {
        /// Patient data file (JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Reference time (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        #[arg(short, long, value_parser = input::parse_datetime)]
        now: NaiveDateTime,

        /// Metadata catalog file (JSON)
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Run an indicator report
    Report {
        /// ETL event data file (JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// First day of the reporting period
        #[arg(short, long, value_parser = input::parse_date)]
        start: NaiveDate,

        /// Last day of the reporting period
        #[arg(short, long, value_parser = input::parse_date)]
        end: NaiveDate,

        /// Reference date (default: end of the period)
        #[arg(short, long, value_parser = input::parse_date)]
        now: Option<NaiveDate>,

        /// Report id
        #[arg(short, long, default_value = DatimQ4ReportBuilder::ID)]
        report: String,
    },

    /// List the columns of an indicator report
    Columns {
        /// Report id
        #[arg(short, long, default_value = DatimQ4ReportBuilder::ID)]
        report: String,
    },
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(cli.color);

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Calculate {
            rule,
            data,
            now,
            catalog,
            params,
        } => calculate::calculate(calculate::CalculateConfig {
            rule,
            data,
            now,
            catalog,
            params,
            output_format: cli.format,
            output_file: cli.output,
        }),

        Commands::Flags { data, now, catalog } => flags::flags(flags::FlagsConfig {
            data,
            now,
            catalog,
            output_format: cli.format,
            output_file: cli.output,
        }),

        Commands::Report {
            data,
            start,
            end,
            now,
            report: id,
        } => report::report(report::ReportConfig {
            report: id,
            data,
            start,
            end,
            now,
            output_format: cli.format,
            output_file: cli.output,
        }),

        Commands::Columns { report: id } => columns::columns(columns::ColumnsConfig {
            report: id,
            output_format: cli.format,
            output_file: cli.output,
        }),
    }
}
