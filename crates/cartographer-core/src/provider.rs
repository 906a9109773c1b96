//! Route metadata sources
//!
//! [`MetadataProvider`] is what the extractor reads routes from.
//! [`RouteManifest`] implements it over a JSON or YAML document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::ExportResult;
use crate::scripts::Script;
use crate::types::HttpMethod;

/// Field name to validation rules, in declaration order
pub type ValidationSchema = IndexMap<String, Vec<String>>;

/// One registered route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// URI template, e.g. `users/{id}`
    pub uri: String,
    pub methods: Vec<HttpMethod>,
    #[serde(default)]
    pub middleware: Vec<String>,
    /// Route name, e.g. `users.show`
    #[serde(default)]
    pub name: Option<String>,
    /// Declaring metadata unit
    #[serde(default)]
    pub unit: Option<String>,
}

/// Metadata declared on a single endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclaredMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Header name to value
    pub headers: IndexMap<String, String>,
    /// Query parameter name to description
    pub params: IndexMap<String, String>,
    pub scripts: Vec<Script>,
    pub group: Option<String>,
}

/// Metadata declared on a unit owning several endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub group: Option<String>,
    pub headers: IndexMap<String, String>,
    pub scripts: Vec<Script>,
    /// Authentication type for the unit's explicit group
    pub auth: Option<String>,
}

/// Source of routes and their declared metadata
pub trait MetadataProvider {
    /// Every registered route, in registration order
    fn list_routes(&self) -> Vec<RouteEntry>;

    fn declared_metadata(&self, route: &RouteEntry) -> Option<DeclaredMetadata>;

    fn validation_schema(&self, route: &RouteEntry) -> Option<ValidationSchema>;

    fn unit_metadata(&self, _unit: &str) -> Option<UnitMetadata> {
        None
    }

    /// Documentation comment of the route's handler
    fn handler_doc(&self, _route: &RouteEntry) -> Option<String> {
        None
    }
}

/// Rules given either as `required|email` or as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Piped(String),
    List(Vec<String>),
}

impl RuleSpec {
    pub fn to_rules(&self) -> Vec<String> {
        match self {
            RuleSpec::Piped(rules) => rules
                .split('|')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect(),
            RuleSpec::List(rules) => rules.iter().map(|r| r.trim().to_string()).collect(),
        }
    }
}

/// A route as written in a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRoute {
    #[serde(flatten)]
    pub route: RouteEntry,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub metadata: Option<DeclaredMetadata>,
    #[serde(default)]
    pub validation: Option<IndexMap<String, RuleSpec>>,
}

/// Route table exported by the host application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteManifest {
    #[serde(default)]
    pub routes: Vec<ManifestRoute>,
    #[serde(default)]
    pub units: IndexMap<String, UnitMetadata>,
}

impl RouteManifest {
    /// Parse a manifest from a string (auto-detects JSON/YAML)
    pub fn parse(content: &str) -> ExportResult<Self> {
        if content.trim().starts_with('{') {
            Self::parse_json(content)
        } else {
            Self::parse_yaml(content)
        }
    }

    pub fn parse_json(content: &str) -> ExportResult<Self> {
        let manifest: Self = serde_json::from_str(content)?;
        debug!("Parsed manifest with {} routes", manifest.routes.len());
        Ok(manifest)
    }

    pub fn parse_yaml(content: &str) -> ExportResult<Self> {
        let manifest: Self = serde_yaml::from_str(content)?;
        debug!("Parsed manifest with {} routes", manifest.routes.len());
        Ok(manifest)
    }

    /// Load a manifest from disk, choosing the parser by extension
    pub fn load(path: &Path) -> ExportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::parse_json(&content),
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            _ => Self::parse(&content),
        }
    }

    fn find(&self, route: &RouteEntry) -> Option<&ManifestRoute> {
        self.routes.iter().find(|r| r.route == *route)
    }
}

impl MetadataProvider for RouteManifest {
    fn list_routes(&self) -> Vec<RouteEntry> {
        self.routes.iter().map(|r| r.route.clone()).collect()
    }

    fn declared_metadata(&self, route: &RouteEntry) -> Option<DeclaredMetadata> {
        self.find(route).and_then(|r| r.metadata.clone())
    }

    fn validation_schema(&self, route: &RouteEntry) -> Option<ValidationSchema> {
        let validation = self.find(route)?.validation.as_ref()?;
        Some(
            validation
                .iter()
                .map(|(field, spec)| (field.clone(), spec.to_rules()))
                .collect(),
        )
    }

    fn unit_metadata(&self, unit: &str) -> Option<UnitMetadata> {
        self.units.get(unit).cloned()
    }

    fn handler_doc(&self, route: &RouteEntry) -> Option<String> {
        self.find(route).and_then(|r| r.doc.clone())
    }
}
