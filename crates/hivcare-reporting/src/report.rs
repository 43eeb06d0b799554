//! Report definitions and builders

use crate::dataset::{CohortIndicatorDataSetDefinition, Parameter};
use crate::error::ReportError;
use crate::mapped::Mapped;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A report: declared parameters plus the datasets it evaluates
pub struct ReportDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    pub datasets: Vec<Mapped<CohortIndicatorDataSetDefinition>>,
}

impl ReportDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            datasets: Vec::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn dataset(&self, name: &str) -> Option<&Mapped<CohortIndicatorDataSetDefinition>> {
        self.datasets.iter().find(|d| d.definition.name() == name)
    }
}

impl fmt::Debug for ReportDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("datasets", &self.datasets)
            .finish()
    }
}

/// Assembles a [`ReportDefinition`]
pub trait ReportBuilder: Send + Sync {
    /// Identifier of the report this builder produces
    fn id(&self) -> &str;

    fn build(&self) -> Result<ReportDefinition, ReportError>;
}

/// Report builders by report id
#[derive(Default)]
pub struct ReportRegistry {
    builders: IndexMap<String, Arc<dyn ReportBuilder>>,
}

impl ReportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in reports
    pub fn with_standard_reports() -> Self {
        let mut registry = Self::new();
        registry.register(crate::builder::DatimQ4ReportBuilder::new());
        registry
    }

    pub fn register<B: ReportBuilder + 'static>(&mut self, builder: B) {
        self.builders.insert(builder.id().to_string(), Arc::new(builder));
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ReportBuilder>> {
        self.builders.get(id).cloned()
    }

    pub fn require(&self, id: &str) -> Result<Arc<dyn ReportBuilder>, ReportError> {
        self.get(id).ok_or_else(|| ReportError::UnknownReport { id: id.to_string() })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyReport;

    impl ReportBuilder for EmptyReport {
        fn id(&self) -> &str {
            "empty"
        }

        fn build(&self) -> Result<ReportDefinition, ReportError> {
            let mut report = ReportDefinition::new(self.id(), "Empty");
            report.parameters.push(Parameter::date("endDate", "End Date"));
            Ok(report)
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ReportRegistry::new();
        registry.register(EmptyReport);

        let report = registry.require("empty").unwrap().build().unwrap();
        assert_eq!(report.id, "empty");
        assert!(report.parameter("endDate").is_some());
        assert!(report.dataset("3").is_none());
        assert_eq!(
            registry.require("monthly").err(),
            Some(ReportError::UnknownReport {
                id: "monthly".to_string()
            })
        );
    }

    #[test]
    fn test_standard_reports() {
        let registry = ReportRegistry::with_standard_reports();
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec![crate::builder::DatimQ4ReportBuilder::ID]
        );
    }
}
