//! Request bodies generated from validation rules

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

use crate::error::ExportError;

/// How a request body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    #[default]
    Raw,
    FormData,
    UrlEncoded,
    File,
    Graphql,
    None,
}

impl BodyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyMode::Raw => "raw",
            BodyMode::FormData => "formdata",
            BodyMode::UrlEncoded => "urlencoded",
            BodyMode::File => "file",
            BodyMode::Graphql => "graphql",
            BodyMode::None => "none",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            BodyMode::Raw | BodyMode::Graphql => "application/json",
            BodyMode::FormData => "multipart/form-data",
            BodyMode::UrlEncoded => "application/x-www-form-urlencoded",
            BodyMode::File => "application/octet-stream",
            BodyMode::None => "none",
        }
    }
}

impl std::fmt::Display for BodyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyMode {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(BodyMode::Raw),
            "formdata" | "form-data" => Ok(BodyMode::FormData),
            "urlencoded" => Ok(BodyMode::UrlEncoded),
            "file" => Ok(BodyMode::File),
            "graphql" => Ok(BodyMode::Graphql),
            "none" => Ok(BodyMode::None),
            _ => Err(ExportError::InvalidBodyMode(s.to_string())),
        }
    }
}

/// A leaf of the body structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyField {
    /// Example or default value
    pub value: Value,
    pub rules: Vec<String>,
    pub description: String,
    pub required: bool,
}

impl BodyField {
    /// Value rendered as form text
    pub fn text_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A node in the nested body structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BodyNode {
    Field(BodyField),
    Object(BodyStructure),
}

/// Field name to node, in rule declaration order
pub type BodyStructure = IndexMap<String, BodyNode>;

/// Default value for a field given its rules
pub fn default_value(rules: &[String]) -> Value {
    let has = |name: &str| {
        rules
            .iter()
            .any(|r| r.split(':').next().map(str::trim) == Some(name))
    };

    if has("array") {
        json!([])
    } else if has("boolean") {
        json!(false)
    } else if has("integer") {
        json!(0)
    } else if has("numeric") {
        json!(0.0)
    } else {
        json!("")
    }
}

/// Insert a field at a dotted path such as `items.*.name`
///
/// `*` segments are skipped. A leaf on the way to a deeper field is replaced
/// by an object; an existing object at the final position is kept.
pub fn insert_field(structure: &mut BodyStructure, path: &str, field: BodyField) {
    let parts: Vec<&str> = path.split('.').filter(|p| *p != "*" && !p.is_empty()).collect();
    insert_parts(structure, &parts, field);
}

fn insert_parts(structure: &mut BodyStructure, parts: &[&str], field: BodyField) {
    let Some((first, rest)) = parts.split_first() else {
        return;
    };

    if rest.is_empty() {
        if !matches!(structure.get(*first), Some(BodyNode::Object(_))) {
            structure.insert(first.to_string(), BodyNode::Field(field));
        }
        return;
    }

    let node = structure
        .entry(first.to_string())
        .or_insert_with(|| BodyNode::Object(BodyStructure::new()));
    if let BodyNode::Field(_) = node {
        *node = BodyNode::Object(BodyStructure::new());
    }
    if let BodyNode::Object(children) = node {
        insert_parts(children, rest, field);
    }
}

/// JSON skeleton of a body structure
pub fn skeleton(structure: &BodyStructure) -> Value {
    let map = structure
        .iter()
        .map(|(key, node)| {
            let value = match node {
                BodyNode::Field(field) => field.value.clone(),
                BodyNode::Object(children) => skeleton(children),
            };
            (key.clone(), value)
        })
        .collect::<serde_json::Map<_, _>>();
    Value::Object(map)
}

/// Flat `(key, field)` pairs with nested keys written as `parent[child]`
pub fn flatten(structure: &BodyStructure) -> Vec<(String, &BodyField)> {
    let mut fields = Vec::new();
    flatten_into(structure, None, &mut fields);
    fields
}

fn flatten_into<'a>(
    structure: &'a BodyStructure,
    prefix: Option<&str>,
    out: &mut Vec<(String, &'a BodyField)>,
) {
    for (key, node) in structure {
        let name = match prefix {
            Some(prefix) => format!("{}[{}]", prefix, key),
            None => key.clone(),
        };
        match node {
            BodyNode::Field(field) => out.push((name, field)),
            BodyNode::Object(children) => flatten_into(children, Some(&name), out),
        }
    }
}

/// A request body in a particular mode
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub mode: BodyMode,
    pub structure: BodyStructure,
}

impl Body {
    pub fn new(mode: BodyMode, structure: BodyStructure) -> Self {
        Self { mode, structure }
    }

    fn pretty_skeleton(&self) -> String {
        serde_json::to_string_pretty(&skeleton(&self.structure)).unwrap_or_else(|_| "{}".to_string())
    }

    /// Postman `body` object, `None` in `none` mode
    pub fn to_postman(&self) -> Option<Value> {
        let body = match self.mode {
            BodyMode::None => return None,
            BodyMode::Raw => json!({
                "mode": "raw",
                "raw": self.pretty_skeleton(),
                "options": { "raw": { "language": "json" } },
            }),
            BodyMode::Graphql => json!({
                "mode": "graphql",
                "graphql": { "query": "", "variables": self.pretty_skeleton() },
            }),
            BodyMode::FormData | BodyMode::UrlEncoded => {
                let fields: Vec<Value> = flatten(&self.structure)
                    .into_iter()
                    .map(|(key, field)| {
                        json!({
                            "key": key,
                            "value": field.text_value(),
                            "type": "text",
                            "description": field.description,
                        })
                    })
                    .collect();
                let mut body = serde_json::Map::new();
                body.insert("mode".to_string(), json!(self.mode.as_str()));
                body.insert(self.mode.as_str().to_string(), Value::Array(fields));
                Value::Object(body)
            }
            BodyMode::File => json!({ "mode": "file", "file": {} }),
        };
        Some(body)
    }

    /// Insomnia `body` object, `None` in `none` mode
    pub fn to_insomnia(&self) -> Option<Value> {
        let body = match self.mode {
            BodyMode::None => return None,
            BodyMode::Raw | BodyMode::Graphql => json!({
                "mimeType": self.mode.mime_type(),
                "text": self.pretty_skeleton(),
            }),
            BodyMode::FormData | BodyMode::UrlEncoded => {
                let params: Vec<Value> = flatten(&self.structure)
                    .into_iter()
                    .map(|(key, field)| {
                        json!({
                            "name": key,
                            "value": field.text_value(),
                            "description": field.description,
                        })
                    })
                    .collect();
                json!({ "mimeType": self.mode.mime_type(), "params": params })
            }
            BodyMode::File => json!({ "mimeType": self.mode.mime_type(), "fileName": "" }),
        };
        Some(body)
    }
}
