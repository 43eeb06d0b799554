//! Parameter mappings
//!
//! A [`Mapped`] pairs a definition with the way its parameters are filled
//! from the enclosing context, written as `"startDate=${startDate},onDate=${endDate}"`.
//! `${name}` copies the parent's parameter; anything else is a literal text value.

use crate::context::ReportContext;
use crate::error::ReportError;
use crate::query::FieldValue;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Source of one mapped parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingValue {
    /// `${name}`, copied from the parent context
    Parameter(String),
    Literal(String),
}

/// Parsed `child=value` pairs, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMapping {
    entries: IndexMap<String, MappingValue>,
}

impl ParameterMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map each name to the parent parameter of the same name
    pub fn pass_through<'n>(names: impl IntoIterator<Item = &'n str>) -> Self {
        let entries = names
            .into_iter()
            .map(|name| (name.to_string(), MappingValue::Parameter(name.to_string())))
            .collect();
        Self { entries }
    }

    /// Parse `"a=${b},c=literal"`; an empty string maps nothing
    pub fn parse(mapping: &str) -> Result<Self, ReportError> {
        let mut entries = IndexMap::new();
        for pair in mapping.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((name, value)) = pair.split_once('=') else {
                return Err(ReportError::invalid_mapping(mapping, format!("'{}' is not name=value", pair)));
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() {
                return Err(ReportError::invalid_mapping(mapping, format!("'{}' has no parameter name", pair)));
            }

            let value = match value.strip_prefix("${") {
                Some(rest) => {
                    let Some(parent) = rest.strip_suffix('}') else {
                        return Err(ReportError::invalid_mapping(mapping, format!("unterminated '{}'", value)));
                    };
                    if parent.is_empty() {
                        return Err(ReportError::invalid_mapping(mapping, "empty ${} reference"));
                    }
                    MappingValue::Parameter(parent.to_string())
                }
                None => MappingValue::Literal(value.to_string()),
            };

            if entries.insert(name.to_string(), value).is_some() {
                return Err(ReportError::invalid_mapping(mapping, format!("'{}' mapped twice", name)));
            }
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Child context holding only the mapped parameters
    pub fn resolve(&self, parent: &ReportContext) -> Result<ReportContext, ReportError> {
        let mut child = parent.child();
        for (name, value) in &self.entries {
            let value = match value {
                MappingValue::Parameter(source) => parent
                    .parameter(source)
                    .cloned()
                    .ok_or_else(|| ReportError::missing_parameter(source))?,
                MappingValue::Literal(text) => FieldValue::Text(text.clone()),
            };
            child.set_parameter(name.clone(), value);
        }
        Ok(child)
    }
}

impl fmt::Display for ParameterMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match value {
                MappingValue::Parameter(source) => write!(f, "{}=${{{}}}", name, source)?,
                MappingValue::Literal(text) => write!(f, "{}={}", name, text)?,
            }
        }
        Ok(())
    }
}

/// A definition together with its parameter mapping
pub struct Mapped<T: ?Sized> {
    pub definition: Arc<T>,
    pub mapping: ParameterMapping,
}

impl<T: ?Sized> Mapped<T> {
    pub fn new(definition: Arc<T>, mapping: ParameterMapping) -> Self {
        Self { definition, mapping }
    }

    /// Map with a mapping string
    pub fn parse(definition: Arc<T>, mapping: &str) -> Result<Self, ReportError> {
        Ok(Self::new(definition, ParameterMapping::parse(mapping)?))
    }

    /// Context the definition is evaluated in
    pub fn resolve(&self, parent: &ReportContext) -> Result<ReportContext, ReportError> {
        self.mapping.resolve(parent)
    }
}

impl<T: ?Sized> Clone for Mapped<T> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            mapping: self.mapping.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Mapped<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapped")
            .field("mapping", &self.mapping.to_string())
            .finish_non_exhaustive()
    }
}
