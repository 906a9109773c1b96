//! Templated request URLs

use serde::Serialize;
use serde_json::{json, Value};

use crate::parameters::ParameterCollection;
use crate::types::ParameterLocation;

/// Variable holding the base URL in both output formats
pub const BASE_URL_VARIABLE: &str = "base_url";

/// A `:name` path variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathVariable {
    pub key: String,
    pub value: String,
    pub description: String,
    pub required: bool,
}

/// A query string entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryEntry {
    pub key: String,
    pub value: String,
    pub description: String,
    pub disabled: bool,
}

/// URL of an endpoint relative to the `base_url` variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Url {
    /// `{{base_url}}/users/:id`
    pub raw: String,
    pub protocol: String,
    pub host: Vec<String>,
    pub port: Option<String>,
    pub path: Vec<String>,
    pub variables: Vec<PathVariable>,
    pub query: Vec<QueryEntry>,
}

impl Url {
    /// Build from a URI template such as `users/{id}` and its resolved parameters
    pub fn from_template(base_url: &str, uri: &str, parameters: &ParameterCollection) -> Self {
        let templated = Self::colon_placeholders(uri);
        let raw = format!("{{{{{}}}}}/{}", BASE_URL_VARIABLE, templated.trim_start_matches('/'))
            .trim_end_matches('/')
            .to_string();

        let (protocol, host, port) = match ::url::Url::parse(base_url) {
            Ok(parsed) => (
                parsed.scheme().to_string(),
                parsed
                    .host_str()
                    .map(|h| vec![h.to_string()])
                    .unwrap_or_else(|| vec![format!("{{{{{}}}}}", BASE_URL_VARIABLE)]),
                parsed.port().map(|p| p.to_string()),
            ),
            Err(_) => (
                "http".to_string(),
                vec![format!("{{{{{}}}}}", BASE_URL_VARIABLE)],
                None,
            ),
        };

        let path = templated
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let variables = parameters
            .by_location(ParameterLocation::Path)
            .map(|p| PathVariable {
                key: p.name.clone(),
                value: p.value.clone(),
                description: p.description.clone(),
                required: p.required,
            })
            .collect();

        let query = parameters
            .by_location(ParameterLocation::Query)
            .map(|p| QueryEntry {
                key: p.name.clone(),
                value: p.value.clone(),
                description: p.description.clone(),
                disabled: false,
            })
            .collect();

        Self {
            raw,
            protocol,
            host,
            port,
            path,
            variables,
            query,
        }
    }

    /// `{id}` and `{id?}` become `:id`
    fn colon_placeholders(uri: &str) -> String {
        let mut out = String::with_capacity(uri.len());
        let mut rest = uri;

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let name = rest[start + 1..start + len].trim_end_matches('?');
            out.push_str(&rest[..start]);
            out.push(':');
            out.push_str(name);
            rest = &rest[start + len + 1..];
        }

        out.push_str(rest);
        out
    }

    /// Postman `url` object
    pub fn to_postman(&self) -> Value {
        let mut url = serde_json::Map::new();
        url.insert("raw".to_string(), json!(self.raw));
        url.insert("protocol".to_string(), json!(self.protocol));
        url.insert("host".to_string(), json!(self.host));
        url.insert("path".to_string(), json!(self.path));
        if let Some(port) = &self.port {
            url.insert("port".to_string(), json!(port));
        }
        if !self.variables.is_empty() {
            let variables: Vec<Value> = self
                .variables
                .iter()
                .map(|v| {
                    json!({
                        "key": v.key,
                        "value": v.value,
                        "description": v.description,
                        "type": "string",
                        "required": v.required,
                    })
                })
                .collect();
            url.insert("variable".to_string(), Value::Array(variables));
        }
        if !self.query.is_empty() {
            url.insert("query".to_string(), json!(self.query));
        }
        Value::Object(url)
    }

    /// URL string with Insomnia's `{{ base_url }}` template syntax
    pub fn to_insomnia(&self) -> String {
        let postman_var = format!("{{{{{}}}}}", BASE_URL_VARIABLE);
        let insomnia_var = format!("{{{{ {} }}}}", BASE_URL_VARIABLE);
        self.raw.replacen(&postman_var, &insomnia_var, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Parameter;

    fn params() -> ParameterCollection {
        let mut params = ParameterCollection::new();
        params.add(Parameter::new("id", ParameterLocation::Path).with_required(true));
        params.add(
            Parameter::new("include", ParameterLocation::Query).with_description("Relations"),
        );
        params
    }

    #[test]
    fn test_from_template() {
        let url = Url::from_template("https://api.example.com:8443", "/example/{id}", &params());

        assert_eq!(url.raw, "{{base_url}}/example/:id");
        assert_eq!(url.protocol, "https");
        assert_eq!(url.host, vec!["api.example.com"]);
        assert_eq!(url.port.as_deref(), Some("8443"));
        assert_eq!(url.path, vec!["example", ":id"]);
        assert_eq!(url.variables.len(), 1);
        assert_eq!(url.query.len(), 1);
        assert_eq!(url.query[0].description, "Relations");
        assert_eq!(url.query[0].value, "");
    }

    #[test]
    fn test_optional_placeholder_and_root() {
        let url = Url::from_template("http://localhost", "posts/{slug?}", &ParameterCollection::new());
        assert_eq!(url.raw, "{{base_url}}/posts/:slug");
        assert!(url.port.is_none());

        let url = Url::from_template("http://localhost", "/", &ParameterCollection::new());
        assert_eq!(url.raw, "{{base_url}}");
        assert!(url.path.is_empty());
    }

    #[test]
    fn test_unparseable_base_url() {
        let url = Url::from_template("not a url", "users", &ParameterCollection::new());
        assert_eq!(url.protocol, "http");
        assert_eq!(url.host, vec!["{{base_url}}"]);
    }

    #[test]
    fn test_output_views() {
        let url = Url::from_template("http://localhost", "users/{id}", &params());
        assert_eq!(url.to_insomnia(), "{{ base_url }}/users/:id");

        let postman = url.to_postman();
        assert_eq!(postman["variable"][0]["key"], "id");
        assert_eq!(postman["query"][0]["key"], "include");
        assert!(postman.get("port").is_none());
    }
}
