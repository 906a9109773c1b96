//! End-to-end exports from a route manifest

use cartographer_core::{
    AuthStrategyFactory, ExportConfig, ExportError, Exporter, Format, RouteManifest,
};
use serde_json::Value;
use std::collections::HashSet;

const SHOP_MANIFEST: &str = r#"
routes:
  - uri: example/{id}
    methods: [GET, HEAD]
    middleware: [api]
    metadata:
      params:
        include: Related resources to embed
  - uri: shop/products
    methods: [GET, HEAD]
    middleware: [api]
  - uri: shop/products
    methods: [POST]
    middleware: [api, auth:api]
    validation:
      title: required|string
      price: required|numeric
  - uri: shop/products/{product}
    methods: [PUT, PATCH, DELETE]
    middleware: [api, auth:api]
  - uri: shop/orders/{order}/items
    methods: [GET]
    middleware: [api]
  - uri: telescope/requests
    methods: [GET]
    middleware: [web]
"#;

fn manifest() -> RouteManifest {
    RouteManifest::parse(SHOP_MANIFEST).unwrap()
}

fn bearer_config(token: &str) -> ExportConfig {
    let mut config = ExportConfig::default();
    config.authentication.method = Some("bearer".to_string());
    config.authentication.token = Some(token.to_string());
    config
}

fn export(config: &ExportConfig, format: Format) -> Value {
    let factory = AuthStrategyFactory::new();
    Exporter::new(config, &factory)
        .unwrap()
        .export(&manifest(), format)
        .unwrap()
}

fn export_manifest(manifest: &RouteManifest, config: &ExportConfig, format: Format) -> Value {
    let factory = AuthStrategyFactory::new();
    Exporter::new(config, &factory)
        .unwrap()
        .export(manifest, format)
        .unwrap()
}

/// Every Postman request item, depth first
fn postman_requests(items: &Value, out: &mut Vec<Value>) {
    for item in items.as_array().into_iter().flatten() {
        if item.get("request").is_some() {
            out.push(item.clone());
        } else {
            postman_requests(&item["item"], out);
        }
    }
}

fn insomnia_resources<'a>(doc: &'a Value, kind: &str) -> Vec<&'a Value> {
    doc["resources"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["_type"] == kind)
        .collect()
}

/// Replace generated identifiers and timestamps with a fixed marker
fn strip_generated(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                match key.as_str() {
                    "_postman_id" | "id" | "_id" | "parentId" | "__export_date" => {
                        *entry = Value::String("<generated>".to_string())
                    }
                    _ => strip_generated(entry),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_generated),
        _ => {}
    }
}

#[test]
fn test_endpoint_count_matches_admitted_non_head_methods() {
    let doc = export(&ExportConfig::default(), Format::Postman);
    let mut requests = Vec::new();
    postman_requests(&doc["item"], &mut requests);

    // 1 + 1 + 1 + 3 + 1; HEAD and the web-only route are dropped
    assert_eq!(requests.len(), 7);
    assert!(requests.iter().all(|r| r["request"]["method"] != "HEAD"));

    let doc = export(&ExportConfig::default(), Format::Insomnia);
    assert_eq!(insomnia_resources(&doc, "request").len(), 7);
}

#[test]
fn test_insomnia_ids_are_unique_and_prefixed() {
    let doc = export(&bearer_config("T"), Format::Insomnia);
    let resources = doc["resources"].as_array().unwrap();

    let mut seen = HashSet::new();
    for resource in resources {
        let id = resource["_id"].as_str().unwrap();
        assert!(seen.insert(id.to_string()), "duplicate id {id}");

        let prefix = match resource["_type"].as_str().unwrap() {
            "workspace" => "wrk_",
            "environment" => "env_",
            "request_group" => "fld_",
            "request" => "req_",
            "request_hook" => "scr_",
            other => panic!("unexpected resource type {other}"),
        };
        assert!(id.starts_with(prefix), "{id} should start with {prefix}");
    }

    let workspace = insomnia_resources(&doc, "workspace")[0]["_id"].clone();
    for resource in resources.iter().filter(|r| r["_type"] != "workspace") {
        let parent = resource["parentId"].as_str().unwrap();
        assert!(seen.contains(parent));
    }
    assert_eq!(insomnia_resources(&doc, "environment")[0]["parentId"], workspace);
}

#[test]
fn test_shared_prefix_resolves_to_single_group() {
    let doc = export(&ExportConfig::default(), Format::Postman);
    let items = doc["item"].as_array().unwrap();

    let shops: Vec<_> = items.iter().filter(|i| i["name"] == "Shop").collect();
    assert_eq!(shops.len(), 1);

    // products routes share the `shop` prefix; the items route nests under Orders
    let shop_items = shops[0]["item"].as_array().unwrap();
    assert_eq!(shop_items.len(), 6);
    let orders: Vec<_> = shop_items.iter().filter(|i| i["name"] == "Orders").collect();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["item"].as_array().unwrap().len(), 1);

    let doc = export(&ExportConfig::default(), Format::Insomnia);
    let folders: Vec<_> = insomnia_resources(&doc, "request_group")
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(folders, vec!["Shop", "Orders"]);
}

#[test]
fn test_bearer_token_rendering() {
    let config = bearer_config("T");

    let doc = export(&config, Format::Postman);
    let token = doc["variable"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["key"] == "token")
        .unwrap();
    assert_eq!(token["value"], "T");

    let mut requests = Vec::new();
    postman_requests(&doc["item"], &mut requests);
    for request in requests.iter().filter(|r| r["request"]["method"] != "GET") {
        let auth = &request["request"]["auth"];
        assert_eq!(auth["type"], "bearer");
        assert_eq!(auth["bearer"][0]["value"], "{{token}}");
    }

    let doc = export(&config, Format::Insomnia);
    let environment = insomnia_resources(&doc, "environment")[0];
    assert_eq!(environment["data"]["token"], "T");
    for request in insomnia_resources(&doc, "request")
        .into_iter()
        .filter(|r| r["method"] != "GET")
    {
        let auth = &request["authentication"];
        assert_eq!(auth["type"], "bearer");
        assert_eq!(auth["prefix"], "Bearer");
        assert_eq!(auth["token"], "{{ token }}");
    }
}

#[test]
fn test_path_variable_and_declared_query() {
    let doc = export(&ExportConfig::default(), Format::Postman);
    let example = doc["item"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == "example/{id}")
        .unwrap();

    let url = &example["request"]["url"];
    assert_eq!(url["raw"], "{{base_url}}/example/:id");

    let variables = url["variable"].as_array().unwrap();
    assert_eq!(variables.len(), 1);
    assert_eq!(variables[0]["key"], "id");

    let query = url["query"].as_array().unwrap();
    assert_eq!(query.len(), 1);
    assert_eq!(query[0]["key"], "include");
    assert_eq!(query[0]["value"], "");
    assert_eq!(query[0]["description"], "Related resources to embed");
}

#[test]
fn test_users_scenario_in_route_mode() {
    let manifest = RouteManifest::parse(
        r#"
routes:
  - uri: users
    methods: [GET]
    middleware: [api]
    name: users.index
    metadata:
      params:
        page: Page number
        per_page: Results per page
  - uri: users
    methods: [POST]
    middleware: [api]
    name: users.store
    validation:
      name: required|string
      email: required|email
"#,
    )
    .unwrap();

    let config = ExportConfig {
        structured_by: "route".to_string(),
        ..Default::default()
    };
    let factory = AuthStrategyFactory::new();
    let doc = Exporter::new(&config, &factory)
        .unwrap()
        .export(&manifest, Format::Postman)
        .unwrap();

    let items = doc["item"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Users");

    let endpoints = items[0]["item"].as_array().unwrap();
    assert_eq!(endpoints.len(), 2);

    let raw = endpoints[1]["request"]["body"]["raw"].as_str().unwrap();
    let body: Value = serde_json::from_str(raw).unwrap();
    let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["name", "email"]);
}

#[test]
fn test_users_scenario_in_path_mode_stays_at_root() {
    let manifest = RouteManifest::parse(
        r#"
routes:
  - uri: users
    methods: [GET]
    middleware: [api]
    name: users.index
  - uri: users
    methods: [POST]
    middleware: [api]
    name: users.store
    validation:
      name: required|string
      email: required|email
"#,
    )
    .unwrap();

    let config = ExportConfig::default();
    let factory = AuthStrategyFactory::new();
    let doc = Exporter::new(&config, &factory)
        .unwrap()
        .export(&manifest, Format::Postman)
        .unwrap();

    // single-segment paths get no folder
    let items = doc["item"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.get("request").is_some()));
    assert_eq!(items[0]["request"]["method"], "GET");
    assert_eq!(items[1]["request"]["method"], "POST");
}

#[test]
fn test_public_routes_do_not_inherit_collection_auth() {
    let manifest = RouteManifest::parse(
        r#"
routes:
  - uri: status
    methods: [GET]
    middleware: [api]
  - uri: orders
    methods: [POST]
    middleware: [api, auth:api]
"#,
    )
    .unwrap();

    let config = bearer_config("T");
    let factory = AuthStrategyFactory::new();
    let doc = Exporter::new(&config, &factory)
        .unwrap()
        .export(&manifest, Format::Postman)
        .unwrap();

    assert_eq!(doc["auth"]["type"], "bearer");
    let items = doc["item"].as_array().unwrap();
    let status = items.iter().find(|i| i["name"] == "status").unwrap();
    assert_eq!(status["request"]["auth"]["type"], "noauth");
    let orders = items.iter().find(|i| i["name"] == "orders").unwrap();
    assert_eq!(orders["request"]["auth"]["type"], "bearer");
}

#[test]
fn test_unit_group_metadata_survives_earlier_path_group() {
    let manifest = RouteManifest::parse(
        r#"
routes:
  - uri: billing/reports
    methods: [GET]
    middleware: [api]
  - uri: invoices
    methods: [POST]
    middleware: [api]
    unit: BillingController
units:
  BillingController:
    group: Billing
    description: Invoices and payments
    auth: apikey
"#,
    )
    .unwrap();

    let doc = export_manifest(&manifest, &ExportConfig::default(), Format::Postman);
    let billing = doc["item"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == "Billing")
        .unwrap();
    assert_eq!(billing["description"], "Invoices and payments");
    assert_eq!(billing["auth"]["type"], "apikey");
    assert_eq!(billing["item"].as_array().unwrap().len(), 2);
}

#[test]
fn test_repeated_exports_differ_only_in_generated_values() {
    let config = bearer_config("T");
    for format in [Format::Postman, Format::Insomnia] {
        let mut first = export(&config, format);
        let mut second = export(&config, format);
        strip_generated(&mut first);
        strip_generated(&mut second);

        assert_eq!(
            Exporter::render(&first).unwrap(),
            Exporter::render(&second).unwrap()
        );
    }
}

#[test]
fn test_unknown_auth_method_is_configuration_error() {
    let mut config = ExportConfig::default();
    config.authentication.method = Some("digest".to_string());

    let factory = AuthStrategyFactory::new();
    let err = Exporter::new(&config, &factory).err().unwrap();
    assert!(matches!(err, ExportError::UnsupportedAuthType { .. }));
    assert_eq!(err.kind(), cartographer_core::ErrorKind::Configuration);
}
