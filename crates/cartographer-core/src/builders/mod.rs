//! Collection builders, one per output format
//!
//! Both builders read the same [`GroupTree`] and share collection-level
//! state (basic info, variables, authentication and scripts).

mod insomnia;
mod postman;

pub use insomnia::{InsomniaCollectionBuilder, ResourceIdGenerator, ResourceKind};
pub use postman::{PostmanCollectionBuilder, POSTMAN_SCHEMA};

use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthStrategy;
use crate::error::{ExportError, ExportResult};
use crate::groups::GroupTree;
use crate::scripts::ScriptCollection;
use crate::types::{Endpoint, Format, Variable};

/// Name, description and id of the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub description: String,
    pub id: Uuid,
}

/// Collection-level settings shared by every builder
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    pub info: Option<CollectionInfo>,
    /// Variables in insertion order
    pub variables: Vec<Variable>,
    pub authentication: Option<AuthStrategy>,
    pub scripts: ScriptCollection,
}

impl CollectionState {
    /// Basic info, required before building
    pub fn info(&self) -> ExportResult<&CollectionInfo> {
        self.info.as_ref().ok_or(ExportError::MissingBasicInfo)
    }

    /// Scripts to emit on a request; `None` when it only repeats the collection's own
    pub fn request_scripts<'e>(&self, endpoint: &'e Endpoint) -> Option<&'e ScriptCollection> {
        if endpoint.scripts.is_empty() || endpoint.scripts == self.scripts {
            None
        } else {
            Some(&endpoint.scripts)
        }
    }
}

/// Serialises a [`GroupTree`] into one output format
pub trait CollectionBuilder {
    fn format(&self) -> Format;

    fn state(&self) -> &CollectionState;

    fn state_mut(&mut self) -> &mut CollectionState;

    /// Produce the document; fails when basic info was never set
    fn build(&mut self, tree: &GroupTree) -> ExportResult<Value>;

    fn add_basic_info(&mut self, name: &str, description: &str, id: Uuid) {
        self.state_mut().info = Some(CollectionInfo {
            name: name.to_string(),
            description: description.to_string(),
            id,
        });
    }

    fn add_variable(&mut self, variable: Variable) {
        self.state_mut().variables.push(variable);
    }

    fn set_authentication(&mut self, authentication: Option<AuthStrategy>) {
        self.state_mut().authentication = authentication;
    }

    fn set_scripts(&mut self, scripts: ScriptCollection) {
        self.state_mut().scripts = scripts;
    }
}

/// Builder for the requested format
pub fn builder_for(format: Format) -> Box<dyn CollectionBuilder> {
    match format {
        Format::Postman => Box::new(PostmanCollectionBuilder::new()),
        Format::Insomnia => Box::new(InsomniaCollectionBuilder::new()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::auth::AuthStrategyFactory;
    use crate::config::ExportConfig;
    use crate::extractor::EndpointExtractor;
    use crate::groups::GroupBuilder;
    use crate::provider::RouteManifest;

    pub const MANIFEST: &str = r#"
routes:
  - uri: status
    methods: [GET]
    middleware: [api]
  - uri: shop/orders
    methods: [GET]
    middleware: [api]
    metadata:
      params:
        page: Page number
  - uri: shop/orders
    methods: [POST]
    middleware: [api, auth:api]
    validation:
      sku: required|string
      quantity: required|integer
  - uri: shop/admin/refunds/{refund}
    methods: [DELETE]
    middleware: [api, auth:api]
    metadata:
      scripts:
        - type: pre-request
          content: console.log('refund')
"#;

    pub fn tree() -> GroupTree {
        let mut config = ExportConfig::default();
        config.authentication.method = Some("bearer".to_string());
        let factory = AuthStrategyFactory::new();
        let manifest = RouteManifest::parse(MANIFEST).unwrap();
        let endpoints = EndpointExtractor::new(&config, &factory)
            .unwrap()
            .extract(&manifest)
            .unwrap();
        GroupBuilder::new(&config, &factory).build(endpoints).unwrap()
    }
}
