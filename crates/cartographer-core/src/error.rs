//! Error types for collection export

use thiserror::Error;

use crate::scripts::ScriptType;

/// Result type alias for export operations
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Broad category an [`ExportError`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid format, body mode, auth method or other configuration input
    Configuration,
    /// Generated data failed an integrity check
    Validation,
    /// The document could not be built or written
    Export,
    /// Authentication could not be resolved
    Authentication,
}

/// Export error types
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Invalid export format \"{0}\". Available formats: postman, insomnia")]
    InvalidFormat(String),

    #[error("Invalid body mode \"{0}\". Available modes: raw, formdata, urlencoded, file, graphql, none")]
    InvalidBodyMode(String),

    #[error("Invalid structure mode \"{0}\". Available modes: path, route")]
    InvalidStructureMode(String),

    #[error("Invalid authentication type \"{requested}\". Available types: {available}")]
    UnsupportedAuthType { requested: String, available: String },

    #[error("Missing required configuration key: {0}")]
    MissingConfig(String),

    #[error("Invalid resource ID \"{id}\". Must start with \"{prefix}_\"")]
    InvalidResourceId { id: String, prefix: String },

    #[error("Duplicate resource ID: {0}")]
    DuplicateResourceId(String),

    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("More than one {0} script declared for the same owner")]
    DuplicateScript(ScriptType),

    #[error("Invalid collection structure: basic info not set")]
    MissingBasicInfo,

    #[error("Failed to write file \"{path}\". Error: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Invalid authentication token: {0}")]
    InvalidToken(String),

    #[error("Authentication is configured but no auth middleware is mapped for route \"{0}\"")]
    MissingAuthMiddleware(String),

    #[error("Failed to load script from \"{path}\": {reason}")]
    ScriptLoad { path: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl ExportError {
    /// Map the error onto its taxonomy category
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::InvalidFormat(_)
            | ExportError::InvalidBodyMode(_)
            | ExportError::InvalidStructureMode(_)
            | ExportError::UnsupportedAuthType { .. }
            | ExportError::MissingConfig(_)
            | ExportError::ScriptLoad { .. }
            | ExportError::JsonError(_)
            | ExportError::YamlError(_) => ErrorKind::Configuration,
            ExportError::InvalidResourceId { .. }
            | ExportError::DuplicateResourceId(_)
            | ExportError::EmptyField(_)
            | ExportError::DuplicateScript(_) => ErrorKind::Validation,
            ExportError::MissingBasicInfo
            | ExportError::WriteFailed { .. }
            | ExportError::IoError(_) => ErrorKind::Export,
            ExportError::InvalidToken(_) | ExportError::MissingAuthMiddleware(_) => {
                ErrorKind::Authentication
            }
        }
    }
}
