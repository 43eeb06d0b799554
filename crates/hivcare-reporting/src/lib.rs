//! Cohort Indicator Reporting
//!
//! Aggregate reports count patients in declarative cohorts over flattened
//! ETL event tables.
//!
//! - **Queries**: [`CohortQuery`] trees of [`Predicate`]s, run by a
//!   [`QueryExecutor`] such as the [`InMemoryEventStore`]
//! - **Cohorts**: named [`CohortDefinition`]s with declared parameters
//! - **Datasets**: indicator columns disaggregated by [`Dimension`] options
//! - **Reports**: [`ReportBuilder`]s assembling datasets, run by the
//!   [`ReportRunner`]
//!
//! # Example
//!
//! ```ignore
//! use hivcare_reporting::{DatimQ4ReportBuilder, InMemoryEventStore, ReportBuilder, ReportContext, ReportRunner};
//!
//! let store = InMemoryEventStore::from_json_file("etl.json")?;
//! let report = DatimQ4ReportBuilder::new().build()?;
//! let ctx = ReportContext::new(today)
//!     .with_parameter("startDate", start)
//!     .with_parameter("endDate", end);
//! let data = ReportRunner::new(&store).run(&report, &ctx)?;
//! ```
//!
//! # Failures
//!
//! An empty cohort is a count of zero. A query that does not fit the data it
//! runs against (an unknown table, a date predicate over a text column)
//! fails the whole report; no partial dataset is returned.

pub mod builder;
pub mod cohort;
pub mod context;
pub mod dataset;
pub mod dimension;
pub mod error;
pub mod evaluator;
pub mod library;
pub mod mapped;
pub mod query;
pub mod report;
pub mod store;

pub use builder::DatimQ4ReportBuilder;
pub use cohort::{
    CohortDefinition, CohortDefinitionEvaluator, EvaluatedCohort, HtsTestedPositiveNotLinkedCohortDefinition,
    QueryCohortDefinition,
};
pub use context::ReportContext;
pub use dataset::{
    CohortIndicator, CohortIndicatorDataSetDefinition, ColumnParameters, DataSet, DataSetColumn, DataSetValue,
    Parameter, ParameterKind,
};
pub use dimension::Dimension;
pub use error::{QueryError, ReportError};
pub use evaluator::{DataSetEvaluator, ReportData, ReportRunner};
pub use library::{DatimIndicatorLibrary, ETL_TABLES, ViralLoadIndication};
pub use mapped::{Mapped, ParameterMapping};
pub use query::{AgeUnit, CohortQuery, DateAnchor, DateBound, FieldValue, Predicate, QueryExecutor, Row};
pub use report::{ReportBuilder, ReportDefinition, ReportRegistry};
pub use store::InMemoryEventStore;
