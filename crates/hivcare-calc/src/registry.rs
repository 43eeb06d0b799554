//! Calculation registry
//!
//! Maps calculation names to shared implementations so callers such as the
//! command-line tool can pick a rule by name.

use crate::calculation::{PatientCalculation, PatientFlagCalculation};
use crate::error::{EvalError, EvalResult};
use crate::library::{
    BmiAtArtStartCalculation, InitialArtStartDateCalculation, NeedsViralLoadTestCalculation, OnArtCalculation,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry of named calculations, in registration order
#[derive(Default, Clone)]
pub struct CalculationRegistry {
    calculations: IndexMap<String, Arc<dyn PatientCalculation>>,
    flags: IndexMap<String, Arc<dyn PatientFlagCalculation>>,
}

impl CalculationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard rule library
    pub fn with_standard_library() -> Self {
        let mut registry = Self::new();
        registry.register(OnArtCalculation::new());
        registry.register(InitialArtStartDateCalculation::new());
        registry.register_flag(NeedsViralLoadTestCalculation::new());
        registry.register(BmiAtArtStartCalculation::new());
        registry
    }

    /// Register a calculation under its own name, replacing any previous one
    pub fn register<C: PatientCalculation + 'static>(&mut self, calculation: C) {
        let name = calculation.name().to_string();
        self.calculations.insert(name, Arc::new(calculation));
    }

    /// Register a flag calculation; it is also available as a plain calculation
    pub fn register_flag<C: PatientFlagCalculation + 'static>(&mut self, calculation: C) {
        let name = calculation.name().to_string();
        let shared = Arc::new(calculation);
        self.calculations.insert(name.clone(), shared.clone());
        self.flags.insert(name, shared);
    }

    /// Get a calculation by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn PatientCalculation>> {
        self.calculations.get(name).cloned()
    }

    /// Get a calculation by name or fail with `UnknownCalculation`
    pub fn require(&self, name: &str) -> EvalResult<Arc<dyn PatientCalculation>> {
        self.get(name).ok_or_else(|| EvalError::unknown_calculation(name))
    }

    /// Check if a calculation is registered
    pub fn contains(&self, name: &str) -> bool {
        self.calculations.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.calculations.keys().map(String::as_str)
    }

    /// Registered flag calculations
    pub fn flags(&self) -> impl Iterator<Item = &Arc<dyn PatientFlagCalculation>> {
        self.flags.values()
    }
}
