//! # cartographer-core
//!
//! Exports an application's route table as an API collection.
//! Routes are read from a [`MetadataProvider`], turned into endpoints,
//! grouped into a folder tree and serialised as a Postman v2.1 collection
//! or an Insomnia v4 export.

mod auth;
mod body;
mod builders;
mod config;
mod error;
mod exporter;
mod extractor;
mod groups;
mod output;
mod parameters;
mod provider;
mod rules;
mod scripts;
mod types;
mod url;

pub use auth::{
    AuthHeader, AuthOptions, AuthStrategy, AuthStrategyFactory, AUTHORIZATION_HEADER,
    INSOMNIA_TOKEN_PLACEHOLDER, TOKEN_PLACEHOLDER,
};
pub use body::{Body, BodyField, BodyMode, BodyNode, BodyStructure};
pub use builders::{
    builder_for, CollectionBuilder, CollectionInfo, CollectionState, InsomniaCollectionBuilder,
    PostmanCollectionBuilder, ResourceIdGenerator, ResourceKind, POSTMAN_SCHEMA,
};
pub use config::{AuthenticationConfig, ConfigLoader, ExportConfig, ScriptConfig, ScriptsConfig};
pub use error::{ErrorKind, ExportError, ExportResult};
pub use exporter::{Exporter, TOKEN_VARIABLE};
pub use extractor::EndpointExtractor;
pub use groups::{Group, GroupBuilder, GroupId, GroupTree, TreeItem};
pub use output::{FileSink, FilenameTemplate, MemorySink, OutputSink};
pub use parameters::{ParameterCollection, ParameterResolver, ParameterSources};
pub use provider::{
    DeclaredMetadata, ManifestRoute, MetadataProvider, RouteEntry, RouteManifest, RuleSpec,
    UnitMetadata, ValidationSchema,
};
pub use rules::{HumanRuleFormatter, RawRuleFormatter, RuleFormatter, SilentRuleFormatter};
pub use scripts::{Script, ScriptCollection, ScriptResolver, ScriptType};
pub use types::*;
pub use crate::url::{PathVariable, QueryEntry, Url, BASE_URL_VARIABLE};
