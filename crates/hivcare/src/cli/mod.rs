//! CLI functionality for the hivcare tool
//!
//! This module contains all CLI-related functionality including:
//! - Rule evaluation and flags
//! - Report runs and column listings
//! - Input loading
//! - Output formatting

pub mod calculate;
pub mod columns;
pub mod flags;
pub mod input;
pub mod output;
pub mod report;
