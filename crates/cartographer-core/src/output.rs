//! Output destinations and file naming

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::types::Format;

/// Destination for a finished document
pub trait OutputSink {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> ExportResult<()>;
}

/// Writes to the filesystem, creating parent directories
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSink;

impl OutputSink for FileSink {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> ExportResult<()> {
        let failed = |e: std::io::Error| ExportError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(failed)?;
        }
        std::fs::write(path, bytes).map_err(failed)?;

        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }
}

/// Keeps written documents in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: IndexMap<PathBuf, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents written to `path`, if valid UTF-8
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files
            .get(path)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> ExportResult<()> {
        self.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}

/// Filename with `{timestamp}`, `{app}` and `{format}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate(String);

impl FilenameTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(&self, format: Format, app: &str, now: DateTime<Utc>) -> String {
        self.0
            .replace("{timestamp}", &now.format("%Y_%m_%d_%H%M%S").to_string())
            .replace("{app}", &snake_case(app))
            .replace("{format}", format.as_str())
    }
}

/// `My App` and `MyApp` both become `my_app`
pub fn snake_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let mut prev_lower_or_digit = false;

    for c in value.trim().chars() {
        if c.is_whitespace() || c == '-' || c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower_or_digit = false;
        } else if c.is_uppercase() {
            if prev_lower_or_digit && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower_or_digit = false;
        } else {
            out.push(c);
            prev_lower_or_digit = c.is_lowercase() || c.is_ascii_digit();
        }
    }

    out.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("My App"), "my_app");
        assert_eq!(snake_case("MyApp"), "my_app");
        assert_eq!(snake_case("shop-api v2"), "shop_api_v2");
        assert_eq!(snake_case("app"), "app");
    }

    #[test]
    fn test_filename_template() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let name = FilenameTemplate::new("{timestamp}_{app}_{format}_collection.json")
            .render(Format::Insomnia, "Acme Store", now);
        assert_eq!(name, "2024_03_09_140507_acme_store_insomnia_collection.json");
    }

    #[test]
    fn test_file_sink_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("postman").join("out.json");

        FileSink.write(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_file_sink_reports_write_failure() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let result = FileSink.write(&blocker.join("out.json"), b"{}");
        assert!(matches!(result, Err(ExportError::WriteFailed { .. })));
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.write(Path::new("a/b.json"), b"[]").unwrap();
        assert_eq!(sink.get(Path::new("a/b.json")), Some("[]"));
        assert!(sink.get(Path::new("missing")).is_none());
    }
}
