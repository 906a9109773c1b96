//! Export configuration
//!
//! Loaded from a JSON or YAML file; every key is optional and falls back to
//! the defaults below. Typed accessors validate the free-form selections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::auth::{AuthOptions, AuthStrategy, AuthStrategyFactory};
use crate::body::BodyMode;
use crate::error::{ExportError, ExportResult};
use crate::types::{Header, StructureMode};

/// One configured script slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// File to read the script from; takes precedence over `content`
    pub path: Option<PathBuf>,
    /// Inline script source
    pub content: String,
    /// Whether the script is emitted at all
    pub enabled: bool,
}

/// Collection-wide scripts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    #[serde(rename = "pre-request", alias = "pre_request")]
    pub pre_request: ScriptConfig,
    #[serde(rename = "after-response", alias = "after_response")]
    pub after_response: ScriptConfig,
}

/// Authentication applied to routes behind the auth middleware
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationConfig {
    /// `bearer`, `basic` or `apikey`; unset disables authentication
    pub method: Option<String>,
    /// Secret; a placeholder is exported when unset
    pub token: Option<String>,
    pub options: AuthOptions,
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Base URL stored in the `base_url` collection variable
    pub base_url: String,
    /// Output filename template (`{timestamp}`, `{app}`, `{format}`)
    pub filename: String,
    /// Collection name
    pub name: String,
    /// Collection description
    pub description: String,
    /// Application name substituted for `{app}`
    pub app_name: String,
    /// Build folders from paths or route names
    pub structured: bool,
    /// `path` or `route`
    pub structured_by: String,
    /// Middleware marking a route as authenticated
    pub auth_middleware: String,
    /// Headers applied to every request
    pub headers: Vec<Header>,
    pub scripts: ScriptsConfig,
    /// `raw`, `formdata`, `urlencoded`, `file`, `graphql` or `none`
    pub body_mode: String,
    /// Use handler doc comments as descriptions
    pub include_doc_comments: bool,
    /// Generate request bodies from validation rules
    pub enable_formdata: bool,
    /// Describe fields by their validation rules
    pub print_rules: bool,
    /// Render rules as sentences instead of the raw rule list
    pub rules_to_human_readable: bool,
    /// Example values by field name
    pub formdata: IndexMap<String, serde_json::Value>,
    /// Only routes carrying one of these middleware are exported
    pub include_middleware: Vec<String>,
    /// Directory exported documents are written under
    pub output_dir: PathBuf,
    pub authentication: AuthenticationConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            filename: "{timestamp}_{app}_{format}_collection.json".to_string(),
            name: "Cartographer API Collection".to_string(),
            description: "Cartographer API Collection".to_string(),
            app_name: "app".to_string(),
            structured: true,
            structured_by: "path".to_string(),
            auth_middleware: "auth:api".to_string(),
            headers: vec![
                Header::new("Accept", "application/json"),
                Header::new("Content-Type", "application/json"),
            ],
            scripts: ScriptsConfig::default(),
            body_mode: "raw".to_string(),
            include_doc_comments: false,
            enable_formdata: true,
            print_rules: true,
            rules_to_human_readable: true,
            formdata: IndexMap::new(),
            include_middleware: vec!["api".to_string()],
            output_dir: PathBuf::from("storage"),
            authentication: AuthenticationConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Selected body mode
    pub fn body_mode(&self) -> ExportResult<BodyMode> {
        self.body_mode.parse()
    }

    /// Selected structure mode
    pub fn structure_mode(&self) -> ExportResult<StructureMode> {
        self.structured_by.parse()
    }

    /// Strategy described by the `authentication` section, if any
    pub fn auth_strategy(&self, factory: &AuthStrategyFactory) -> ExportResult<Option<AuthStrategy>> {
        match self.authentication.method.as_deref() {
            Some(method) if !method.trim().is_empty() => factory
                .create(
                    method,
                    self.authentication.token.clone(),
                    &self.authentication.options,
                )
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Check every string selection parses against `factory`'s auth types
    pub fn validate(&self, factory: &AuthStrategyFactory) -> ExportResult<()> {
        self.body_mode()?;
        self.structure_mode()?;
        self.auth_strategy(factory)?;
        if self.name.trim().is_empty() {
            return Err(ExportError::MissingConfig("name".to_string()));
        }
        Ok(())
    }
}

/// Reads [`ExportConfig`] from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, using defaults when the file does not exist
    pub fn load(path: &Path) -> ExportResult<ExportConfig> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(ExportConfig::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            Some("json") => serde_json::from_str(&contents)?,
            _ => Self::parse(&contents)?,
        };

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse configuration content (auto-detects JSON/YAML)
    pub fn parse(content: &str) -> ExportResult<ExportConfig> {
        if content.trim().starts_with('{') {
            Ok(serde_json::from_str(content)?)
        } else {
            Ok(serde_yaml::from_str(content)?)
        }
    }
}
