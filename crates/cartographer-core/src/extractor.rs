//! Endpoint extraction from a route table

use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{AuthStrategy, AuthStrategyFactory};
use crate::body::{Body, BodyMode};
use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};
use crate::parameters::{ParameterResolver, ParameterSources};
use crate::provider::{MetadataProvider, RouteEntry};
use crate::rules::{self, RuleFormatter};
use crate::scripts::ScriptResolver;
use crate::types::{Endpoint, HttpMethod};
use crate::url::Url;

/// Turns admitted routes into one [`Endpoint`] per HTTP method
pub struct EndpointExtractor<'a> {
    config: &'a ExportConfig,
    authentication: Option<AuthStrategy>,
    scripts: ScriptResolver,
    formatter: Box<dyn RuleFormatter>,
    body_mode: BodyMode,
}

impl<'a> EndpointExtractor<'a> {
    pub fn new(config: &'a ExportConfig, factory: &AuthStrategyFactory) -> ExportResult<Self> {
        Ok(Self {
            config,
            authentication: config.auth_strategy(factory)?,
            scripts: ScriptResolver::from_config(&config.scripts)?,
            formatter: rules::formatter_for(config),
            body_mode: config.body_mode()?,
        })
    }

    /// Strategy attached to routes behind the auth middleware
    pub fn authentication(&self) -> Option<&AuthStrategy> {
        self.authentication.as_ref()
    }

    /// Scripts applied when neither endpoint nor unit declare any
    pub fn global_scripts(&self) -> &ScriptResolver {
        &self.scripts
    }

    /// Extract every admitted route
    pub fn extract<P: MetadataProvider + ?Sized>(&self, provider: &P) -> ExportResult<Vec<Endpoint>> {
        let mut endpoints = Vec::new();
        let routes = provider.list_routes();

        for route in &routes {
            endpoints.extend(self.extract_route(provider, route)?);
        }

        info!(
            "Extracted {} endpoints from {} routes",
            endpoints.len(),
            routes.len()
        );
        Ok(endpoints)
    }

    /// Endpoints for a single route, empty when the route is not admitted
    pub fn extract_route<P: MetadataProvider + ?Sized>(
        &self,
        provider: &P,
        route: &RouteEntry,
    ) -> ExportResult<Vec<Endpoint>> {
        if !self.is_admitted(route) {
            debug!("Skipping {}: no allowed middleware", route.uri);
            return Ok(Vec::new());
        }

        let declared = provider.declared_metadata(route);
        let unit = route.unit.as_deref().and_then(|u| provider.unit_metadata(u));
        let validation = provider.validation_schema(route);
        let authentication = self.route_authentication(route)?;

        let name = declared
            .as_ref()
            .and_then(|d| d.name.clone())
            .or_else(|| route.name.clone())
            .unwrap_or_else(|| route.uri.clone());

        let description = match declared.as_ref().and_then(|d| d.description.clone()) {
            Some(description) => description,
            None if self.config.include_doc_comments => {
                provider.handler_doc(route).unwrap_or_default()
            }
            None => String::new(),
        };

        let group = declared
            .as_ref()
            .and_then(|d| d.group.clone())
            .or_else(|| unit.as_ref().and_then(|u| u.group.clone()));

        let scripts = self.scripts.resolve(
            declared.as_ref().map(|d| d.scripts.as_slice()).unwrap_or(&[]),
            unit.as_ref().map(|u| u.scripts.as_slice()).unwrap_or(&[]),
        );

        let resolver = ParameterResolver::new(self.config, self.formatter.as_ref());
        let mut endpoints = Vec::new();

        for &method in route.methods.iter().filter(|m| **m != HttpMethod::Head) {
            let parameters = resolver.resolve(&ParameterSources {
                uri: &route.uri,
                method,
                declared: declared.as_ref(),
                unit: unit.as_ref(),
                validation: validation.as_ref(),
            });

            let body = parameters
                .body()
                .and_then(|p| p.structure.clone())
                .map(|structure| Body::new(self.body_mode, structure));

            let url = Url::from_template(&self.config.base_url, &route.uri, &parameters);

            endpoints.push(Endpoint {
                id: Uuid::new_v4(),
                name: name.clone(),
                route_name: route.name.clone(),
                method,
                uri: route.uri.clone(),
                description: description.clone(),
                parameters,
                url,
                body,
                authentication: authentication.clone(),
                scripts: scripts.clone(),
                group: group.clone(),
                unit: route.unit.clone(),
            });
        }

        Ok(endpoints)
    }

    /// A route is exported when one of its middleware is on the allow-list
    pub fn is_admitted(&self, route: &RouteEntry) -> bool {
        route
            .middleware
            .iter()
            .any(|m| self.config.include_middleware.contains(m))
    }

    fn route_authentication(&self, route: &RouteEntry) -> ExportResult<Option<AuthStrategy>> {
        let Some(strategy) = &self.authentication else {
            return Ok(None);
        };

        let auth_middleware = self.config.auth_middleware.trim();
        if auth_middleware.is_empty() {
            return Err(ExportError::MissingAuthMiddleware(route.uri.clone()));
        }

        Ok(route
            .middleware
            .iter()
            .any(|m| m == auth_middleware)
            .then(|| strategy.clone()))
    }
}
