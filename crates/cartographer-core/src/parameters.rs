//! Parameter collection and resolution

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::body::{self, BodyField, BodyStructure};
use crate::config::ExportConfig;
use crate::provider::{DeclaredMetadata, UnitMetadata, ValidationSchema};
use crate::rules::RuleFormatter;
use crate::types::{HttpMethod, Parameter, ParameterLocation};

/// Parameters of one endpoint, unique by name and location
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterCollection(Vec<Parameter>);

impl ParameterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter unless one with the same name and location exists
    ///
    /// Returns whether the parameter was added.
    pub fn add(&mut self, parameter: Parameter) -> bool {
        if self.find(&parameter.name, parameter.location).is_some() {
            return false;
        }
        self.0.push(parameter);
        true
    }

    pub fn extend(&mut self, parameters: impl IntoIterator<Item = Parameter>) {
        for parameter in parameters {
            self.add(parameter);
        }
    }

    pub fn find(&self, name: &str, location: ParameterLocation) -> Option<&Parameter> {
        self.0
            .iter()
            .find(|p| p.location == location && p.name == name)
    }

    pub fn by_location(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.0.iter().filter(move |p| p.location == location)
    }

    /// The structured body parameter, if any
    pub fn body(&self) -> Option<&Parameter> {
        self.by_location(ParameterLocation::Body).next()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything parameters are derived from for one endpoint
#[derive(Debug, Clone, Copy)]
pub struct ParameterSources<'a> {
    pub uri: &'a str,
    pub method: HttpMethod,
    pub declared: Option<&'a DeclaredMetadata>,
    pub unit: Option<&'a UnitMetadata>,
    pub validation: Option<&'a ValidationSchema>,
}

/// Builds a [`ParameterCollection`] from route template, metadata and rules
pub struct ParameterResolver<'a> {
    config: &'a ExportConfig,
    formatter: &'a dyn RuleFormatter,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(config: &'a ExportConfig, formatter: &'a dyn RuleFormatter) -> Self {
        Self { config, formatter }
    }

    /// Resolve path, query, header and body parameters in that order
    pub fn resolve(&self, sources: &ParameterSources<'_>) -> ParameterCollection {
        let mut parameters = ParameterCollection::new();

        parameters.extend(Self::path_parameters(sources.uri));

        if let Some(declared) = sources.declared {
            for (name, description) in &declared.params {
                parameters.add(
                    Parameter::new(name, ParameterLocation::Query).with_description(description),
                );
            }
        }

        parameters.extend(self.header_parameters(sources.declared, sources.unit));

        if let Some(schema) = sources.validation {
            if sources.method.accepts_body() {
                if let Some(body) = self.body_parameter(schema) {
                    parameters.add(body);
                }
            } else {
                parameters.extend(self.query_parameters(schema));
            }
        }

        debug!(
            "Resolved {} parameters for {} {}",
            parameters.len(),
            sources.method,
            sources.uri
        );
        parameters
    }

    /// Placeholders of a URI template; `{name?}` marks an optional parameter
    ///
    /// Unbalanced braces yield no parameters.
    pub fn path_parameters(uri: &str) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        let mut current: Option<String> = None;

        for c in uri.chars() {
            match (c, current.as_mut()) {
                ('{', None) => current = Some(String::new()),
                ('{', Some(_)) | ('}', None) => return Vec::new(),
                ('}', Some(_)) => {
                    let Some(raw) = current.take() else {
                        return Vec::new();
                    };
                    let optional = raw.ends_with('?');
                    let name = raw.trim_end_matches('?');
                    if !name.is_empty() {
                        parameters.push(
                            Parameter::new(name, ParameterLocation::Path)
                                .with_description(format!("Path parameter: {}", name))
                                .with_required(!optional),
                        );
                    }
                }
                (c, Some(name)) => name.push(c),
                (_, None) => {}
            }
        }

        if current.is_some() {
            return Vec::new();
        }
        parameters
    }

    /// Endpoint headers, then unit headers, then configured ones; first key wins
    fn header_parameters(
        &self,
        declared: Option<&DeclaredMetadata>,
        unit: Option<&UnitMetadata>,
    ) -> Vec<Parameter> {
        let mut seen = HashSet::new();
        let mut headers = Vec::new();

        let mut push = |key: &str, value: &str, description: String| {
            if seen.insert(key.to_lowercase()) {
                headers.push(
                    Parameter::new(key, ParameterLocation::Header)
                        .with_value(value)
                        .with_description(description),
                );
            }
        };

        for (key, value) in declared.map(|d| &d.headers).into_iter().flatten() {
            push(key.as_str(), value.as_str(), format!("Request header: {}", key));
        }
        for (key, value) in unit.map(|u| &u.headers).into_iter().flatten() {
            push(key.as_str(), value.as_str(), format!("Group header: {}", key));
        }
        for header in &self.config.headers {
            let description = header
                .description
                .clone()
                .unwrap_or_else(|| "Global header".to_string());
            push(header.key.as_str(), header.value.as_str(), description);
        }

        headers
    }

    /// Each field, plus a `<field>_confirmation` companion for `confirmed` rules
    fn expand_fields(schema: &ValidationSchema) -> IndexMap<String, Vec<String>> {
        let mut fields = IndexMap::new();
        for (field, rules) in schema {
            fields.insert(field.clone(), rules.clone());
            if rules.iter().any(|r| r == "confirmed") {
                fields
                    .entry(format!("{}_confirmation", field))
                    .or_insert_with(|| rules.clone());
            }
        }
        fields
    }

    fn example_value(&self, field: &str, rules: &[String]) -> serde_json::Value {
        self.config
            .formdata
            .get(field)
            .cloned()
            .unwrap_or_else(|| body::default_value(rules))
    }

    fn query_parameters(&self, schema: &ValidationSchema) -> Vec<Parameter> {
        Self::expand_fields(schema)
            .into_iter()
            .map(|(field, rules)| {
                let value = match self.config.formdata.get(&field) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                Parameter::new(&field, ParameterLocation::Query)
                    .with_description(self.formatter.format(&field, &rules))
                    .with_value(value)
                    .with_rules(rules)
            })
            .collect()
    }

    fn body_parameter(&self, schema: &ValidationSchema) -> Option<Parameter> {
        if !self.config.enable_formdata {
            return None;
        }

        let mut structure = BodyStructure::new();
        for (field, rules) in Self::expand_fields(schema) {
            let field_value = BodyField {
                value: self.example_value(&field, &rules),
                description: self.formatter.format(&field, &rules),
                required: rules.iter().any(|r| r == "required"),
                rules,
            };
            body::insert_field(&mut structure, &field, field_value);
        }

        if structure.is_empty() {
            return None;
        }

        let mut parameter = Parameter::new("body", ParameterLocation::Body)
            .with_description("Request body parameters");
        parameter.structure = Some(structure);
        Some(parameter)
    }
}
