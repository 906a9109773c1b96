//! Insomnia export format v4

use serde_json::{json, Map, Value};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use super::{CollectionBuilder, CollectionState};
use crate::error::{ExportError, ExportResult};
use crate::groups::{GroupId, GroupTree, TreeItem};
use crate::types::{Endpoint, Format, ParameterLocation};

/// Kinds of resource in an Insomnia export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Workspace,
    Environment,
    RequestGroup,
    Request,
    RequestHook,
}

impl ResourceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ResourceKind::Workspace => "wrk",
            ResourceKind::Environment => "env",
            ResourceKind::RequestGroup => "fld",
            ResourceKind::Request => "req",
            ResourceKind::RequestHook => "scr",
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            ResourceKind::Workspace => "workspace",
            ResourceKind::Environment => "environment",
            ResourceKind::RequestGroup => "request_group",
            ResourceKind::Request => "request",
            ResourceKind::RequestHook => "request_hook",
        }
    }
}

/// Issues `<prefix>_<hex>` identifiers, each at most once per export
#[derive(Debug, Default)]
pub struct ResourceIdGenerator {
    used: HashSet<String>,
}

impl ResourceIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&mut self, kind: ResourceKind) -> ExportResult<String> {
        self.register(format!("{}_{}", kind.prefix(), Uuid::new_v4().simple()), kind)
    }

    /// Accept an externally chosen identifier after checking prefix and uniqueness
    pub fn register(&mut self, id: String, kind: ResourceKind) -> ExportResult<String> {
        let prefix = kind.prefix();
        let valid = id
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|rest| !rest.is_empty());
        if !valid {
            return Err(ExportError::InvalidResourceId {
                id,
                prefix: prefix.to_string(),
            });
        }
        if !self.used.insert(id.clone()) {
            return Err(ExportError::DuplicateResourceId(id));
        }
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// Builds a flat resource list linked by `parentId`
#[derive(Debug, Default)]
pub struct InsomniaCollectionBuilder {
    state: CollectionState,
}

/// Resources accumulated during one build
struct Emitter<'a> {
    state: &'a CollectionState,
    tree: &'a GroupTree,
    ids: ResourceIdGenerator,
    resources: Vec<Value>,
}

impl<'a> Emitter<'a> {
    fn resource(&mut self, kind: ResourceKind, parent: Option<&str>) -> ExportResult<(String, Map<String, Value>)> {
        let id = self.ids.generate(kind)?;
        let mut resource = Map::new();
        resource.insert("_id".to_string(), json!(id));
        resource.insert("_type".to_string(), json!(kind.resource_type()));
        resource.insert("parentId".to_string(), json!(parent));
        Ok((id, resource))
    }

    fn workspace(&mut self) -> ExportResult<String> {
        let state = self.state;
        let info = state.info()?;
        let (id, mut workspace) = self.resource(ResourceKind::Workspace, None)?;
        workspace.insert("name".to_string(), json!(info.name));
        workspace.insert("description".to_string(), json!(info.description));
        workspace.insert("scope".to_string(), json!("collection"));
        self.resources.push(Value::Object(workspace));
        Ok(id)
    }

    fn environment(&mut self, workspace: &str) -> ExportResult<()> {
        let (_, mut environment) = self.resource(ResourceKind::Environment, Some(workspace))?;
        let data: Map<String, Value> = self
            .state
            .variables
            .iter()
            .map(|v| (v.key.clone(), json!(v.value)))
            .collect();
        environment.insert("name".to_string(), json!("Base Environment"));
        environment.insert("data".to_string(), Value::Object(data));
        self.resources.push(Value::Object(environment));
        Ok(())
    }

    fn request_hooks(&mut self, workspace: &str) -> ExportResult<()> {
        let state = self.state;
        for script in state.scripts.iter() {
            let (_, mut hook) = self.resource(ResourceKind::RequestHook, Some(workspace))?;
            hook.insert("name".to_string(), json!(format!("{} script", script.script_type.label())));
            hook.insert("hookType".to_string(), json!(script.script_type.to_string()));
            hook.insert("content".to_string(), json!(script.content));
            hook.insert("disabled".to_string(), json!(!script.enabled));
            self.resources.push(Value::Object(hook));
        }
        Ok(())
    }

    fn item(&mut self, item: TreeItem, parent: &str, sort_key: usize) -> ExportResult<()> {
        let tree = self.tree;
        match item {
            TreeItem::Group(id) => self.group(id, parent, sort_key),
            TreeItem::Endpoint(index) => match tree.endpoint(index) {
                Some(endpoint) => self.request(endpoint, parent, sort_key),
                None => Ok(()),
            },
        }
    }

    fn group(&mut self, group_id: GroupId, parent: &str, sort_key: usize) -> ExportResult<()> {
        let tree = self.tree;
        let Some(group) = tree.group(group_id) else {
            return Ok(());
        };

        let (id, mut folder) = self.resource(ResourceKind::RequestGroup, Some(parent))?;
        folder.insert("name".to_string(), json!(group.name));
        folder.insert("description".to_string(), json!(group.description));
        folder.insert("environment".to_string(), json!({}));
        folder.insert("environmentPropertyOrder".to_string(), Value::Null);
        folder.insert("metaSortKey".to_string(), json!(sort_key));
        if let Some(auth) = &group.authentication {
            folder.insert("authentication".to_string(), auth.to_insomnia());
        }
        if !group.headers.is_empty() {
            let headers: Vec<Value> = group
                .headers
                .iter()
                .map(|h| json!({ "name": h.key, "value": h.value }))
                .collect();
            folder.insert("headers".to_string(), Value::Array(headers));
        }
        group.scripts.apply_insomnia(&mut folder)?;
        self.resources.push(Value::Object(folder));

        let children = group
            .endpoints
            .iter()
            .map(|&e| TreeItem::Endpoint(e))
            .chain(group.children.iter().map(|&g| TreeItem::Group(g)));
        for (sort_key, child) in children.enumerate() {
            self.item(child, &id, sort_key)?;
        }
        Ok(())
    }

    fn request(&mut self, endpoint: &Endpoint, parent: &str, sort_key: usize) -> ExportResult<()> {
        let (_, mut request) = self.resource(ResourceKind::Request, Some(parent))?;
        request.insert("name".to_string(), json!(endpoint.name));
        request.insert("description".to_string(), json!(endpoint.description));
        request.insert("method".to_string(), json!(endpoint.method.as_str()));
        request.insert("url".to_string(), json!(endpoint.url.to_insomnia()));

        let parameters = |location| -> Vec<Value> {
            endpoint
                .parameters
                .by_location(location)
                .map(|p| {
                    json!({
                        "name": p.name,
                        "value": p.value,
                        "description": p.description,
                        "disabled": false,
                    })
                })
                .collect()
        };
        request.insert("headers".to_string(), json!(parameters(ParameterLocation::Header)));
        request.insert("pathParameters".to_string(), json!(parameters(ParameterLocation::Path)));
        request.insert("parameters".to_string(), json!(parameters(ParameterLocation::Query)));

        if let Some(body) = endpoint.body.as_ref().and_then(|b| b.to_insomnia()) {
            request.insert("body".to_string(), body);
        }
        if let Some(auth) = &endpoint.authentication {
            request.insert("authentication".to_string(), auth.to_insomnia());
        }
        let state = self.state;
        if let Some(scripts) = state.request_scripts(endpoint) {
            scripts.apply_insomnia(&mut request)?;
        }
        request.insert("metaSortKey".to_string(), json!(sort_key));

        self.resources.push(Value::Object(request));
        Ok(())
    }
}

impl InsomniaCollectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionBuilder for InsomniaCollectionBuilder {
    fn format(&self) -> Format {
        Format::Insomnia
    }

    fn state(&self) -> &CollectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CollectionState {
        &mut self.state
    }

    fn build(&mut self, tree: &GroupTree) -> ExportResult<Value> {
        self.state.info()?;

        let mut emitter = Emitter {
            state: &self.state,
            tree,
            ids: ResourceIdGenerator::new(),
            resources: Vec::new(),
        };

        let workspace = emitter.workspace()?;
        emitter.environment(&workspace)?;
        emitter.request_hooks(&workspace)?;
        for (sort_key, item) in tree.roots().iter().enumerate() {
            emitter.item(*item, &workspace, sort_key)?;
        }

        debug!(
            "Built Insomnia export with {} resources",
            emitter.resources.len()
        );

        Ok(json!({
            "_type": "export",
            "__export_format": 4,
            "__export_date": chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            "__export_source": "cartographer",
            "resources": emitter.resources,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;
    use crate::scripts::{Script, ScriptType};
    use crate::types::Variable;

    fn build(builder: &mut InsomniaCollectionBuilder) -> Value {
        builder.add_basic_info("Shop", "Shop API", Uuid::new_v4());
        builder.add_variable(Variable::new("base_url", "http://localhost"));
        builder.add_variable(Variable::new("token", "T"));
        builder.build(&fixtures::tree()).unwrap()
    }

    fn resources(doc: &Value) -> &Vec<Value> {
        doc["resources"].as_array().unwrap()
    }

    #[test]
    fn test_id_generator() {
        let mut ids = ResourceIdGenerator::new();
        let id = ids.generate(ResourceKind::Request).unwrap();
        assert!(id.starts_with("req_"));

        assert!(matches!(
            ids.register(id.clone(), ResourceKind::Request),
            Err(ExportError::DuplicateResourceId(_))
        ));
        assert!(matches!(
            ids.register("fld_1".to_string(), ResourceKind::Request),
            Err(ExportError::InvalidResourceId { .. })
        ));
        assert!(matches!(
            ids.register("req_".to_string(), ResourceKind::Request),
            Err(ExportError::InvalidResourceId { .. })
        ));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_export_envelope() {
        let doc = build(&mut InsomniaCollectionBuilder::new());
        assert_eq!(doc["_type"], "export");
        assert_eq!(doc["__export_format"], 4);
        assert_eq!(doc["__export_source"], "cartographer");

        let resources = resources(&doc);
        assert_eq!(resources[0]["_type"], "workspace");
        assert_eq!(resources[0]["parentId"], Value::Null);
        assert_eq!(resources[1]["_type"], "environment");
        assert_eq!(resources[1]["data"]["token"], "T");
    }

    #[test]
    fn test_ids_unique_prefixed_and_linked() {
        let doc = build(&mut InsomniaCollectionBuilder::new());
        let resources = resources(&doc);

        let mut seen = HashSet::new();
        for resource in resources {
            let id = resource["_id"].as_str().unwrap();
            let prefix = match resource["_type"].as_str().unwrap() {
                "workspace" => "wrk_",
                "environment" => "env_",
                "request_group" => "fld_",
                "request" => "req_",
                "request_hook" => "scr_",
                other => panic!("unexpected resource type {}", other),
            };
            assert!(id.starts_with(prefix));
            assert!(seen.insert(id.to_string()));
        }

        for resource in &resources[1..] {
            let parent = resource["parentId"].as_str().unwrap();
            assert!(seen.contains(parent));
        }
    }

    #[test]
    fn test_depth_first_order_and_sort_keys() {
        let doc = build(&mut InsomniaCollectionBuilder::new());
        let resources = resources(&doc);
        let workspace = resources[0]["_id"].as_str().unwrap();

        let summary: Vec<(String, String, u64)> = resources[2..]
            .iter()
            .map(|r| {
                (
                    r["_type"].as_str().unwrap().to_string(),
                    r["name"].as_str().unwrap().to_string(),
                    r["metaSortKey"].as_u64().unwrap(),
                )
            })
            .collect();
        let expected = [
            ("request", "status", 0),
            ("request_group", "Shop", 1),
            ("request", "shop/orders", 0),
            ("request", "shop/orders", 1),
            ("request_group", "Admin", 2),
            ("request", "shop/admin/refunds/{refund}", 0),
        ];
        let expected: Vec<(String, String, u64)> = expected
            .iter()
            .map(|(t, n, k)| (t.to_string(), n.to_string(), *k))
            .collect();
        assert_eq!(summary, expected);

        assert_eq!(resources[2]["parentId"], workspace);
        assert_eq!(resources[4]["parentId"], resources[3]["_id"]);
        assert_eq!(resources[7]["parentId"], resources[6]["_id"]);
    }

    #[test]
    fn test_request_details() {
        let doc = build(&mut InsomniaCollectionBuilder::new());
        let resources = resources(&doc);

        let list = &resources[4];
        assert_eq!(list["url"], "{{ base_url }}/shop/orders");
        assert_eq!(list["parameters"][0]["name"], "page");

        let create = &resources[5];
        assert_eq!(create["authentication"]["type"], "bearer");
        assert_eq!(create["authentication"]["token"], "{{ token }}");
        assert_eq!(create["body"]["mimeType"], "application/json");

        let refund = &resources[7];
        assert_eq!(refund["url"], "{{ base_url }}/shop/admin/refunds/:refund");
        assert_eq!(refund["pathParameters"][0]["name"], "refund");
        assert_eq!(refund["preRequestScript"], "console.log('refund')");
    }

    #[test]
    fn test_collection_scripts_become_hooks() {
        let mut builder = InsomniaCollectionBuilder::new();
        builder.set_scripts(vec![Script::new(ScriptType::PreRequest, "setup()")].into());
        let doc = build(&mut builder);
        let resources = resources(&doc);

        assert_eq!(resources[2]["_type"], "request_hook");
        assert_eq!(resources[2]["parentId"], resources[0]["_id"]);
        assert_eq!(resources[2]["content"], "setup()");
        assert!(resources[2]["_id"].as_str().unwrap().starts_with("scr_"));
    }
}
