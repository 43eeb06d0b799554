//! Cohort dimensions
//!
//! A dimension splits a population into named options, such as `gender=F`
//! or `age=10-14`. Each option is a mapped cohort definition; a column's
//! count is its indicator cohort intersected with the selected options.

use crate::cohort::CohortDefinition;
use crate::dataset::Parameter;
use crate::error::ReportError;
use crate::mapped::Mapped;
use indexmap::IndexMap;
use std::fmt;

pub struct Dimension {
    name: String,
    description: String,
    parameters: Vec<Parameter>,
    options: IndexMap<String, Mapped<dyn CohortDefinition>>,
}

impl Dimension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            options: IndexMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    /// Add an option; option names are unique within the dimension
    pub fn add_option(
        &mut self,
        option: impl Into<String>,
        cohort: Mapped<dyn CohortDefinition>,
    ) -> Result<(), ReportError> {
        let option = option.into();
        if self.options.contains_key(&option) {
            return Err(ReportError::invalid_definition(
                &self.name,
                format!("option '{}' defined twice", option),
            ));
        }
        self.options.insert(option, cohort);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn option(&self, option: &str) -> Option<&Mapped<dyn CohortDefinition>> {
        self.options.get(option)
    }

    /// Option names in declaration order
    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }
}

impl fmt::Debug for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dimension")
            .field("name", &self.name)
            .field("options", &self.options.keys().collect::<Vec<_>>())
            .finish()
    }
}
