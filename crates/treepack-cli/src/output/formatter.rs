//! Output formatter trait for CLI results.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use treepack_core::CreationReport;
use treepack_core::EntryHeader;
use treepack_core::ExtractionReport;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format creation result
    fn format_creation_result(&self, report: &CreationReport) -> Result<()>;

    /// Format extraction result
    fn format_extraction_result(&self, target: &Path, report: &ExtractionReport) -> Result<()>;

    /// Format entry names, one per line
    fn format_entries_short(&self, entries: &[EntryHeader]) -> Result<()>;

    /// Format entries with their metadata
    fn format_entries_long(&self, entries: &[EntryHeader], human_readable: bool) -> Result<()>;

    /// Format an error that ended `operation`
    fn format_error(&self, operation: &str, error: &anyhow::Error);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}
