//! Postman collection v2.1

use serde_json::{json, Map, Value};
use tracing::debug;

use super::{CollectionBuilder, CollectionState};
use crate::error::ExportResult;
use crate::groups::{GroupId, GroupTree, TreeItem};
use crate::types::{Endpoint, Format, Header, ParameterLocation};

/// Schema URL written into `info.schema`
pub const POSTMAN_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Builds a nested `item` tree mirroring the group hierarchy
#[derive(Debug, Default)]
pub struct PostmanCollectionBuilder {
    state: CollectionState,
}

impl PostmanCollectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn headers(headers: &[Header]) -> Value {
        Value::Array(
            headers
                .iter()
                .map(|h| {
                    json!({
                        "key": h.key,
                        "value": h.value,
                        "type": "text",
                        "description": h.description.clone().unwrap_or_default(),
                    })
                })
                .collect(),
        )
    }

    /// A request without auth inherits its parent's in Postman, so public
    /// requests under collection-level auth need an explicit `noauth`.
    /// Folder auth declared by a unit is left to apply.
    fn endpoint_item(&self, endpoint: &Endpoint, opt_out: bool) -> Value {
        let mut request = Map::new();
        request.insert("method".to_string(), json!(endpoint.method.as_str()));
        if !endpoint.description.is_empty() {
            request.insert("description".to_string(), json!(endpoint.description));
        }
        request.insert("url".to_string(), endpoint.url.to_postman());

        let headers: Vec<Value> = endpoint
            .parameters
            .by_location(ParameterLocation::Header)
            .map(|p| {
                json!({
                    "key": p.name,
                    "value": p.value,
                    "type": "text",
                    "description": p.description,
                })
            })
            .collect();
        request.insert("header".to_string(), Value::Array(headers));

        if let Some(body) = endpoint.body.as_ref().and_then(|b| b.to_postman()) {
            request.insert("body".to_string(), body);
        }
        match &endpoint.authentication {
            Some(auth) => {
                request.insert("auth".to_string(), auth.to_postman());
            }
            None if opt_out => {
                request.insert("auth".to_string(), json!({ "type": "noauth" }));
            }
            None => {}
        }

        let mut item = Map::new();
        item.insert("name".to_string(), json!(endpoint.name));
        item.insert("request".to_string(), Value::Object(request));
        if let Some(scripts) = self.state.request_scripts(endpoint) {
            item.insert("event".to_string(), Value::Array(scripts.to_postman()));
        }
        item.insert("response".to_string(), json!([]));
        Value::Object(item)
    }

    fn group_item(&self, tree: &GroupTree, id: GroupId) -> Value {
        let Some(group) = tree.group(id) else {
            return Value::Null;
        };

        let opt_out =
            self.state.authentication.is_some() && tree.effective_authentication(id).is_none();
        let mut items: Vec<Value> = group
            .endpoints
            .iter()
            .filter_map(|&index| tree.endpoint(index))
            .map(|endpoint| self.endpoint_item(endpoint, opt_out))
            .collect();
        items.extend(group.children.iter().map(|&child| self.group_item(tree, child)));

        let mut item = Map::new();
        item.insert("name".to_string(), json!(group.name));
        item.insert("description".to_string(), json!(group.description));
        item.insert("item".to_string(), Value::Array(items));
        if let Some(auth) = &group.authentication {
            item.insert("auth".to_string(), auth.to_postman());
        }
        if !group.headers.is_empty() {
            item.insert("header".to_string(), Self::headers(&group.headers));
        }
        if !group.scripts.is_empty() {
            item.insert("event".to_string(), Value::Array(group.scripts.to_postman()));
        }
        Value::Object(item)
    }
}

impl CollectionBuilder for PostmanCollectionBuilder {
    fn format(&self) -> Format {
        Format::Postman
    }

    fn state(&self) -> &CollectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CollectionState {
        &mut self.state
    }

    fn build(&mut self, tree: &GroupTree) -> ExportResult<Value> {
        let info = self.state.info()?;

        let mut document = Map::new();
        document.insert(
            "info".to_string(),
            json!({
                "_postman_id": info.id.to_string(),
                "name": info.name,
                "description": info.description,
                "schema": POSTMAN_SCHEMA,
                "version": { "major": 1, "minor": 0, "patch": 0 },
            }),
        );
        document.insert("variable".to_string(), json!(self.state.variables));
        if let Some(auth) = &self.state.authentication {
            document.insert("auth".to_string(), auth.to_postman());
        }
        if !self.state.scripts.is_empty() {
            document.insert("event".to_string(), Value::Array(self.state.scripts.to_postman()));
        }

        let items: Vec<Value> = tree
            .roots()
            .iter()
            .filter_map(|item| match *item {
                TreeItem::Group(id) => Some(self.group_item(tree, id)),
                TreeItem::Endpoint(index) => tree
                    .endpoint(index)
                    .map(|e| self.endpoint_item(e, self.state.authentication.is_some())),
            })
            .collect();
        debug!("Built Postman collection with {} top-level items", items.len());
        document.insert("item".to_string(), Value::Array(items));

        Ok(Value::Object(document))
    }
}
