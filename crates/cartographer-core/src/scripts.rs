//! Pre-request and after-response scripts

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::config::{ScriptConfig, ScriptsConfig};
use crate::error::{ExportError, ExportResult};

/// When a script runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    #[serde(rename = "pre-request", alias = "pre_request")]
    PreRequest,
    #[serde(rename = "after-response", alias = "after_response")]
    AfterResponse,
}

impl ScriptType {
    /// Postman event `listen` value
    pub fn postman_listen(&self) -> &'static str {
        match self {
            ScriptType::PreRequest => "prerequest",
            ScriptType::AfterResponse => "test",
        }
    }

    /// Insomnia field holding the script
    pub fn insomnia_field(&self) -> &'static str {
        match self {
            ScriptType::PreRequest => "preRequestScript",
            ScriptType::AfterResponse => "afterResponseScript",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScriptType::PreRequest => "Pre-request",
            ScriptType::AfterResponse => "After-response",
        }
    }
}

impl std::fmt::Display for ScriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptType::PreRequest => f.write_str("pre-request"),
            ScriptType::AfterResponse => f.write_str("after-response"),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// A script attached to a collection, group or endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    pub content: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Script {
    pub fn new(script_type: ScriptType, content: impl Into<String>) -> Self {
        Self {
            script_type,
            content: content.into(),
            enabled: true,
        }
    }

    /// Postman event entry
    pub fn to_postman(&self) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "listen": self.script_type.postman_listen(),
            "script": {
                "type": "text/javascript",
                "exec": self.content.split('\n').collect::<Vec<_>>(),
            },
            "disabled": !self.enabled,
        })
    }

    /// Insomnia inline script, `None` when disabled
    pub fn to_insomnia(&self) -> Option<&str> {
        self.enabled.then_some(self.content.as_str())
    }
}

/// Ordered scripts of one owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptCollection(Vec<Script>);

impl ScriptCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, script: Script) {
        self.0.push(script);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.0.iter()
    }

    /// The single script of the given type
    ///
    /// Two scripts of the same type on one owner are rejected.
    pub fn by_type(&self, script_type: ScriptType) -> ExportResult<Option<&Script>> {
        let mut matches = self.0.iter().filter(|s| s.script_type == script_type);
        let first = matches.next();
        if matches.next().is_some() {
            return Err(ExportError::DuplicateScript(script_type));
        }
        Ok(first)
    }

    /// Postman `event` array
    pub fn to_postman(&self) -> Vec<Value> {
        self.0.iter().map(Script::to_postman).collect()
    }

    /// Insert `preRequestScript`/`afterResponseScript` fields into an Insomnia resource
    pub fn apply_insomnia(&self, resource: &mut serde_json::Map<String, Value>) -> ExportResult<()> {
        for script_type in [ScriptType::PreRequest, ScriptType::AfterResponse] {
            if let Some(content) = self.by_type(script_type)?.and_then(Script::to_insomnia) {
                resource.insert(script_type.insomnia_field().to_string(), json!(content));
            }
        }
        Ok(())
    }
}

impl From<Vec<Script>> for ScriptCollection {
    fn from(scripts: Vec<Script>) -> Self {
        Self(scripts)
    }
}

impl FromIterator<Script> for ScriptCollection {
    fn from_iter<I: IntoIterator<Item = Script>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Chooses the scripts that apply to an endpoint
pub struct ScriptResolver {
    global: ScriptCollection,
}

impl ScriptResolver {
    /// Build a resolver, loading configured scripts from disk where needed
    pub fn from_config(config: &ScriptsConfig) -> ExportResult<Self> {
        Ok(Self {
            global: Self::load_config_scripts(config)?,
        })
    }

    /// Scripts declared in configuration, enabled entries only
    pub fn global(&self) -> &ScriptCollection {
        &self.global
    }

    /// Endpoint-declared scripts win over unit-declared ones, which win over configuration
    pub fn resolve(&self, endpoint: &[Script], unit: &[Script]) -> ScriptCollection {
        if !endpoint.is_empty() {
            return endpoint.to_vec().into();
        }
        if !unit.is_empty() {
            return unit.to_vec().into();
        }
        self.global.clone()
    }

    fn load_config_scripts(config: &ScriptsConfig) -> ExportResult<ScriptCollection> {
        let mut scripts = ScriptCollection::new();

        for (script_type, entry) in [
            (ScriptType::PreRequest, &config.pre_request),
            (ScriptType::AfterResponse, &config.after_response),
        ] {
            if !entry.enabled {
                continue;
            }
            let content = Self::load_content(entry)?;
            debug!("Loaded {} script from configuration", script_type);
            scripts.push(Script::new(script_type, content));
        }

        Ok(scripts)
    }

    fn load_content(entry: &ScriptConfig) -> ExportResult<String> {
        match entry.path.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => {
                std::fs::read_to_string(path).map_err(|e| ExportError::ScriptLoad {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
            _ => Ok(entry.content.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn enabled(content: &str) -> ScriptConfig {
        ScriptConfig {
            path: None,
            content: content.to_string(),
            enabled: true,
        }
    }

    #[test]
    fn test_by_type_rejects_duplicates() {
        let scripts: ScriptCollection = vec![
            Script::new(ScriptType::PreRequest, "a"),
            Script::new(ScriptType::PreRequest, "b"),
        ]
        .into();

        assert!(matches!(
            scripts.by_type(ScriptType::PreRequest),
            Err(ExportError::DuplicateScript(ScriptType::PreRequest))
        ));
        assert!(scripts.by_type(ScriptType::AfterResponse).unwrap().is_none());
    }

    #[test]
    fn test_postman_event_splits_lines() {
        let event = Script::new(ScriptType::AfterResponse, "line1\nline2").to_postman();
        assert_eq!(event["listen"], "test");
        assert_eq!(event["script"]["exec"], json!(["line1", "line2"]));
        assert_eq!(event["disabled"], false);
    }

    #[test]
    fn test_resolve_precedence() {
        let config = ScriptsConfig {
            pre_request: enabled("global()"),
            after_response: ScriptConfig::default(),
        };
        let resolver = ScriptResolver::from_config(&config).unwrap();

        let endpoint = vec![Script::new(ScriptType::PreRequest, "endpoint()")];
        let unit = vec![Script::new(ScriptType::PreRequest, "unit()")];

        let resolved = resolver.resolve(&endpoint, &unit);
        assert_eq!(resolved.iter().next().unwrap().content, "endpoint()");

        let resolved = resolver.resolve(&[], &unit);
        assert_eq!(resolved.iter().next().unwrap().content, "unit()");

        let resolved = resolver.resolve(&[], &[]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.iter().next().unwrap().content, "global()");
    }

    #[test]
    fn test_disabled_config_scripts_are_skipped() {
        let resolver = ScriptResolver::from_config(&ScriptsConfig::default()).unwrap();
        assert!(resolver.global().is_empty());
    }

    #[test]
    fn test_config_script_loaded_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "pm.environment.set('x', 1);").unwrap();

        let config = ScriptsConfig {
            pre_request: ScriptConfig {
                path: Some(file.path().to_path_buf()),
                content: "ignored".to_string(),
                enabled: true,
            },
            after_response: ScriptConfig::default(),
        };

        let resolver = ScriptResolver::from_config(&config).unwrap();
        let script = resolver.global().by_type(ScriptType::PreRequest).unwrap().unwrap();
        assert_eq!(script.content, "pm.environment.set('x', 1);");
    }

    #[test]
    fn test_missing_script_file_is_an_error() {
        let config = ScriptsConfig {
            pre_request: ScriptConfig {
                path: Some("/nonexistent/cartographer/pre.js".into()),
                content: String::new(),
                enabled: true,
            },
            after_response: ScriptConfig::default(),
        };

        assert!(matches!(
            ScriptResolver::from_config(&config),
            Err(ExportError::ScriptLoad { .. })
        ));
    }
}
