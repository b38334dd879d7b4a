//! JSON output formatter for machine-readable results.

use std::io;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use treepack_core::CreationReport;
use treepack_core::EntryHeader;
use treepack_core::EntryKind;
use treepack_core::ExtractionReport;

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;

pub struct JsonFormatter;

#[derive(Serialize)]
struct EntryOutput<'a> {
    name: &'a str,
    kind: &'static str,
    mode: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gid: Option<u32>,
    mtime: i64,
    size: u64,
}

impl<'a> From<&'a EntryHeader> for EntryOutput<'a> {
    fn from(entry: &'a EntryHeader) -> Self {
        Self {
            name: entry.name.as_str(),
            kind: match entry.kind {
                EntryKind::File => "file",
                EntryKind::Directory => "directory",
            },
            mode: entry.metadata.mode,
            uid: entry.metadata.uid,
            gid: entry.metadata.gid,
            mtime: entry.metadata.mtime,
            size: entry.size,
        }
    }
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_creation_result(&self, report: &CreationReport) -> Result<()> {
        #[derive(Serialize)]
        struct CreationOutput {
            archive_path: String,
            format: String,
            files_added: usize,
            directories_added: usize,
            bytes_read: u64,
            bytes_written: u64,
            compression_ratio: f64,
            duration_ms: u128,
        }

        let data = CreationOutput {
            archive_path: report.archive_path.display().to_string(),
            format: report.format.to_string(),
            files_added: report.files_added,
            directories_added: report.directories_added,
            bytes_read: report.bytes_read,
            bytes_written: report.bytes_written,
            compression_ratio: report.compression_ratio(),
            duration_ms: report.duration.as_millis(),
        };

        Self::output(&JsonOutput::success("create", data))
    }

    fn format_extraction_result(&self, target: &Path, report: &ExtractionReport) -> Result<()> {
        #[derive(Serialize)]
        struct ExtractionOutput {
            target: String,
            files_extracted: usize,
            directories_created: usize,
            bytes_written: u64,
            duration_ms: u128,
        }

        let data = ExtractionOutput {
            target: target.display().to_string(),
            files_extracted: report.files_extracted,
            directories_created: report.directories_created,
            bytes_written: report.bytes_written,
            duration_ms: report.duration.as_millis(),
        };

        Self::output(&JsonOutput::success("extract", data))
    }

    fn format_entries_short(&self, entries: &[EntryHeader]) -> Result<()> {
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        Self::output(&JsonOutput::success("list", names))
    }

    fn format_entries_long(&self, entries: &[EntryHeader], _human_readable: bool) -> Result<()> {
        let data: Vec<EntryOutput<'_>> = entries.iter().map(EntryOutput::from).collect();
        Self::output(&JsonOutput::success("list", data))
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::error(operation, format!("{error:#}"));
        let _ = Self::output(&output);
    }
}
