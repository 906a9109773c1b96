//! Authentication strategies and the factory that creates them

use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ExportError, ExportResult};

/// Token rendered when no secret was supplied, and in every Postman view
pub const TOKEN_PLACEHOLDER: &str = "{{token}}";

/// Token placeholder in Insomnia's template syntax
pub const INSOMNIA_TOKEN_PLACEHOLDER: &str = "{{ token }}";

/// Name of the header every strategy writes to
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Strategy-specific construction options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOptions {
    /// Header value prefix for API key authentication
    #[serde(default)]
    pub prefix: Option<String>,
}

/// How requests authenticate against the exported API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Authorization: Bearer <token>
    Bearer { token: Option<String> },
    /// Authorization: Basic base64(<user:pass>)
    Basic { token: Option<String> },
    /// Authorization: <prefix> <token>
    ApiKey { token: Option<String>, prefix: String },
}

/// Format-neutral header representation of a strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthHeader {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub header_type: String,
}

impl AuthStrategy {
    /// Lowercase type name used in both output schemas
    pub fn auth_type(&self) -> &'static str {
        match self {
            AuthStrategy::Bearer { .. } => "bearer",
            AuthStrategy::Basic { .. } => "basic",
            AuthStrategy::ApiKey { .. } => "apikey",
        }
    }

    /// Header value prefix
    pub fn prefix(&self) -> &str {
        match self {
            AuthStrategy::Bearer { .. } => "Bearer",
            AuthStrategy::Basic { .. } => "Basic",
            AuthStrategy::ApiKey { prefix, .. } => prefix.as_str(),
        }
    }

    /// The configured token, or the placeholder when none was supplied
    pub fn token(&self) -> &str {
        self.secret().unwrap_or(TOKEN_PLACEHOLDER)
    }

    /// The configured token, if any
    pub fn secret(&self) -> Option<&str> {
        match self {
            AuthStrategy::Bearer { token }
            | AuthStrategy::Basic { token }
            | AuthStrategy::ApiKey { token, .. } => token.as_deref(),
        }
    }

    /// Check the supplied token is usable for this strategy
    pub fn validate(&self) -> ExportResult<()> {
        let Some(token) = self.secret() else {
            return Ok(());
        };

        if token.trim().is_empty() {
            return Err(ExportError::InvalidToken("token is empty".to_string()));
        }
        if token.chars().any(|c| c == '\n' || c == '\r') {
            return Err(ExportError::InvalidToken(
                "token must not contain line breaks".to_string(),
            ));
        }
        if let AuthStrategy::Basic { .. } = self {
            if !token.contains(':') {
                return Err(ExportError::InvalidToken(
                    "basic credentials must be given as user:password".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Generic `Authorization` header record
    pub fn to_header(&self) -> AuthHeader {
        let credential = match self {
            AuthStrategy::Basic { .. } => {
                base64::engine::general_purpose::STANDARD.encode(self.token().as_bytes())
            }
            _ => self.token().to_string(),
        };

        AuthHeader {
            key: AUTHORIZATION_HEADER.to_string(),
            value: format!("{} {}", self.prefix(), credential),
            header_type: "string".to_string(),
        }
    }

    /// Postman `auth` object; the secret itself lives in the `token` variable
    pub fn to_postman(&self) -> Value {
        let auth_type = self.auth_type();
        let attributes = match self {
            AuthStrategy::ApiKey { prefix, .. } => json!([
                { "key": "key", "value": AUTHORIZATION_HEADER, "type": "string" },
                { "key": "value", "value": format!("{} {}", prefix, TOKEN_PLACEHOLDER), "type": "string" },
                { "key": "in", "value": "header", "type": "string" },
            ]),
            _ => json!([
                { "key": "token", "value": TOKEN_PLACEHOLDER, "type": "string" },
            ]),
        };

        let mut auth = serde_json::Map::new();
        auth.insert("type".to_string(), json!(auth_type));
        auth.insert(auth_type.to_string(), attributes);
        Value::Object(auth)
    }

    /// Insomnia `authentication` object
    pub fn to_insomnia(&self) -> Value {
        json!({
            "type": self.auth_type(),
            "token": INSOMNIA_TOKEN_PLACEHOLDER,
            "prefix": self.prefix(),
            "disabled": false,
        })
    }
}

type StrategyConstructor = fn(Option<String>, &AuthOptions) -> AuthStrategy;

/// Creates strategies from a type string
///
/// The registry is open: additional names can be registered, e.g. a `token`
/// alias for API keys with a different prefix.
#[derive(Debug, Clone)]
pub struct AuthStrategyFactory {
    registry: IndexMap<String, StrategyConstructor>,
}

impl AuthStrategyFactory {
    pub fn new() -> Self {
        let mut factory = Self {
            registry: IndexMap::new(),
        };
        factory.register("bearer", |token, _| AuthStrategy::Bearer { token });
        factory.register("basic", |token, _| AuthStrategy::Basic { token });
        factory.register("apikey", |token, options| AuthStrategy::ApiKey {
            token,
            prefix: options.prefix.clone().unwrap_or_else(|| "ApiKey".to_string()),
        });
        factory
    }

    /// Register or replace a strategy under `name`
    pub fn register(&mut self, name: &str, constructor: StrategyConstructor) {
        self.registry.insert(name.to_lowercase(), constructor);
    }

    /// Names accepted by [`AuthStrategyFactory::create`]
    pub fn supported(&self) -> Vec<&str> {
        self.registry.keys().map(String::as_str).collect()
    }

    /// Build and validate a strategy
    pub fn create(
        &self,
        auth_type: &str,
        token: Option<String>,
        options: &AuthOptions,
    ) -> ExportResult<AuthStrategy> {
        let constructor = self
            .registry
            .get(&auth_type.to_lowercase())
            .ok_or_else(|| ExportError::UnsupportedAuthType {
                requested: auth_type.to_string(),
                available: self.supported().join(", "),
            })?;

        let strategy = constructor(token, options);
        strategy.validate()?;
        Ok(strategy)
    }
}

impl Default for AuthStrategyFactory {
    fn default() -> Self {
        Self::new()
    }
}
