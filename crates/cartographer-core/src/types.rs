//! Type definitions shared across the export pipeline

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::AuthStrategy;
use crate::body::Body;
use crate::error::ExportError;
use crate::parameters::ParameterCollection;
use crate::scripts::ScriptCollection;
use crate::url::Url;

/// HTTP methods a route may answer to
///
/// Serialised uppercase; any casing is accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Copy,
    Head,
    Options,
    Link,
    Unlink,
    Purge,
    Lock,
    Unlock,
    Propfind,
    View,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Copy => "COPY",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Link => "LINK",
            HttpMethod::Unlink => "UNLINK",
            HttpMethod::Purge => "PURGE",
            HttpMethod::Lock => "LOCK",
            HttpMethod::Unlock => "UNLOCK",
            HttpMethod::Propfind => "PROPFIND",
            HttpMethod::View => "VIEW",
        }
    }

    /// GET and HEAD carry their inputs in the query string, everything else in a body
    pub fn accepts_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let method = String::deserialize(deserializer)?;
        method.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "COPY" => Ok(HttpMethod::Copy),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "LINK" => Ok(HttpMethod::Link),
            "UNLINK" => Ok(HttpMethod::Unlink),
            "PURGE" => Ok(HttpMethod::Purge),
            "LOCK" => Ok(HttpMethod::Lock),
            "UNLOCK" => Ok(HttpMethod::Unlock),
            "PROPFIND" => Ok(HttpMethod::Propfind),
            "VIEW" => Ok(HttpMethod::View),
            other => Err(format!("unknown HTTP method: {}", other)),
        }
    }
}

/// Where a parameter travels in the HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

/// A request parameter resolved for an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (`body` for the structured body parameter)
    pub name: String,
    /// Where the parameter is located
    pub location: ParameterLocation,
    /// Default value, empty when nothing better is known
    pub value: String,
    /// Human-readable description
    pub description: String,
    /// Whether the parameter is required
    pub required: bool,
    /// Validation rules the value is subject to
    pub rules: Vec<String>,
    /// Example value
    pub example: Option<String>,
    /// Nested field map, only set on body parameters
    pub structure: Option<crate::body::BodyStructure>,
}

impl Parameter {
    /// Create a parameter with empty value and no rules
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            value: String::new(),
            description: String::new(),
            required: false,
            rules: Vec::new(),
            example: None,
            structure: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_rules(mut self, rules: Vec<String>) -> Self {
        self.required = rules.iter().any(|r| r == "required");
        self.rules = rules;
        self
    }
}

/// A plain key/value header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: None,
        }
    }
}

/// Collection-scoped variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub var_type: String,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            var_type: "string".to_string(),
        }
    }
}

/// Supported output schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Nested item tree, collection v2.1
    Postman,
    /// Flat resource list, export v4
    Insomnia,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Postman => "postman",
            Format::Insomnia => "insomnia",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postman" => Ok(Format::Postman),
            "insomnia" => Ok(Format::Insomnia),
            _ => Err(ExportError::InvalidFormat(s.to_string())),
        }
    }
}

/// How structured exports derive folder segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMode {
    /// Segments of the URI template
    #[default]
    Path,
    /// Dotted or colon separated route name
    Route,
}

impl FromStr for StructureMode {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "path" | "route_path" => Ok(StructureMode::Path),
            "route" | "name" | "route_name" => Ok(StructureMode::Route),
            _ => Err(ExportError::InvalidStructureMode(s.to_string())),
        }
    }
}

/// One (route, method) pair ready for export
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Unique identifier for this run
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Registered route name, e.g. `users.index`
    pub route_name: Option<String>,
    /// HTTP method
    pub method: HttpMethod,
    /// URI template as registered (e.g. `users/{id}`)
    pub uri: String,
    /// Description, possibly empty
    pub description: String,
    /// Path, query, header and body parameters
    pub parameters: ParameterCollection,
    /// Templated URL representation
    pub url: Url,
    /// Request body, if the method and configuration allow one
    pub body: Option<Body>,
    /// Authentication strategy applied to this endpoint
    pub authentication: Option<AuthStrategy>,
    /// Lifecycle scripts
    pub scripts: ScriptCollection,
    /// Explicit group assignment
    pub group: Option<String>,
    /// Declaring metadata unit, used for group descriptions
    pub unit: Option<String>,
}

impl Endpoint {
    /// Route URI without surrounding slashes
    pub fn path(&self) -> &str {
        self.uri.trim_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_method_serde_casing() {
        let method: HttpMethod = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(method, HttpMethod::Delete);
        assert_eq!(serde_json::to_string(&HttpMethod::Get).unwrap(), "\"GET\"");
        assert!(serde_json::from_str::<HttpMethod>("\"fetch\"").is_err());
    }

    #[test]
    fn test_accepts_body() {
        assert!(!HttpMethod::Get.accepts_body());
        assert!(!HttpMethod::Head.accepts_body());
        assert!(HttpMethod::Post.accepts_body());
        assert!(HttpMethod::Delete.accepts_body());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("Insomnia".parse::<Format>().unwrap(), Format::Insomnia);
        let err = "bruno".parse::<Format>().unwrap_err();
        assert!(matches!(err, ExportError::InvalidFormat(f) if f == "bruno"));
    }

    #[test]
    fn test_structure_mode_aliases() {
        assert_eq!("route_name".parse::<StructureMode>().unwrap(), StructureMode::Route);
        assert_eq!("path".parse::<StructureMode>().unwrap(), StructureMode::Path);
        assert!("tags".parse::<StructureMode>().is_err());
    }

    #[test]
    fn test_rules_set_required() {
        let param = Parameter::new("email", ParameterLocation::Query)
            .with_rules(vec!["required".into(), "email".into()]);
        assert!(param.required);

        let param = Parameter::new("page", ParameterLocation::Query)
            .with_rules(vec!["integer".into()]);
        assert!(!param.required);
    }
}
