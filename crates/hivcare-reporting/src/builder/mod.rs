//! Report builders

pub mod datim_q4;

pub use datim_q4::DatimQ4ReportBuilder;
