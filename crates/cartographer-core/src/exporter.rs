//! Export pipeline: extraction, grouping, building and output

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthStrategyFactory;
use crate::builders::builder_for;
use crate::config::ExportConfig;
use crate::error::ExportResult;
use crate::extractor::EndpointExtractor;
use crate::groups::GroupBuilder;
use crate::output::{FilenameTemplate, OutputSink};
use crate::provider::{MetadataProvider, UnitMetadata};
use crate::types::{Format, Variable};
use crate::url::BASE_URL_VARIABLE;

/// Name of the collection variable carrying the auth token
pub const TOKEN_VARIABLE: &str = "token";

/// Runs one export per call; no state is shared between runs
pub struct Exporter<'a> {
    config: &'a ExportConfig,
    factory: &'a AuthStrategyFactory,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a ExportConfig, factory: &'a AuthStrategyFactory) -> ExportResult<Self> {
        config.validate(factory)?;
        Ok(Self { config, factory })
    }

    /// Build the collection document for `format`
    pub fn export<P: MetadataProvider + ?Sized>(
        &self,
        provider: &P,
        format: Format,
    ) -> ExportResult<Value> {
        let extractor = EndpointExtractor::new(self.config, self.factory)?;
        let endpoints = extractor.extract(provider)?;
        let endpoint_count = endpoints.len();

        let tree = GroupBuilder::new(self.config, self.factory)
            .with_units(Self::units(provider))
            .build(endpoints)?;

        let mut builder = builder_for(format);
        builder.add_basic_info(&self.config.name, &self.config.description, Uuid::new_v4());
        builder.add_variable(Variable::new(BASE_URL_VARIABLE, self.config.base_url.as_str()));

        let authentication = extractor.authentication().cloned();
        if let Some(strategy) = &authentication {
            builder.add_variable(Variable::new(TOKEN_VARIABLE, strategy.secret().unwrap_or("")));
        }
        builder.set_authentication(authentication);
        builder.set_scripts(extractor.global_scripts().global().clone());

        let document = builder.build(&tree)?;
        info!(
            "Exported {} endpoints in {} groups as {}",
            endpoint_count,
            tree.groups().len(),
            format
        );
        Ok(document)
    }

    /// Pretty-printed JSON text of a document
    pub fn render(document: &Value) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(document)?)
    }

    /// Output path relative to the configured output directory
    pub fn output_path(&self, format: Format, now: DateTime<Utc>) -> PathBuf {
        let filename =
            FilenameTemplate::new(self.config.filename.as_str()).render(format, &self.config.app_name, now);
        self.config.output_dir.join(format.as_str()).join(filename)
    }

    /// Export and hand the finished document to `sink`
    pub fn export_to<P: MetadataProvider + ?Sized>(
        &self,
        provider: &P,
        format: Format,
        sink: &mut dyn OutputSink,
        now: DateTime<Utc>,
    ) -> ExportResult<PathBuf> {
        let document = self.export(provider, format)?;
        let rendered = Self::render(&document)?;

        let path = self.output_path(format, now);
        sink.write(&path, rendered.as_bytes())?;
        info!("Collection written to {:?}", path);
        Ok(path)
    }

    fn units<P: MetadataProvider + ?Sized>(provider: &P) -> IndexMap<String, UnitMetadata> {
        let mut units = IndexMap::new();
        for route in provider.list_routes() {
            let Some(unit) = route.unit else { continue };
            if units.contains_key(&unit) {
                continue;
            }
            if let Some(metadata) = provider.unit_metadata(&unit) {
                units.insert(unit, metadata);
            }
        }
        units
    }
}
