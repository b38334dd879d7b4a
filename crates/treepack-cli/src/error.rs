//! Error conversion utilities for CLI.
//!
//! Converts treepack-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use std::path::Path;

use anyhow::anyhow;
use treepack_core::ArchiveError;

/// Converts `ArchiveError` to a user-friendly anyhow error with context.
pub fn convert_archive_error(err: ArchiveError, subject: &Path) -> anyhow::Error {
    match err {
        ArchiveError::NotFound { path } => {
            anyhow!(
                "Not found: '{}'\n\
                 HINT: Check the path; it is resolved relative to the current directory.",
                path.display()
            )
        }
        ArchiveError::UnsupportedFormat { format } => {
            anyhow!(
                "Archive format not supported: {format}\n\
                 HINT: Supported formats: tar.gz (tgz), zip"
            )
        }
        ArchiveError::PathTraversal { name } => {
            anyhow!(
                "Security violation: Archive '{}' contains entry '{name}' that escapes the target directory\n\
                 HINT: This archive may be malicious. Do not extract from untrusted sources.",
                subject.display()
            )
        }
        ArchiveError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid archive '{}': {reason}\n\
                 HINT: The archive may be corrupted or use a different format than requested.",
                subject.display()
            )
        }
        ArchiveError::Entry { path, source } => {
            let hint = if source.kind() == std::io::ErrorKind::PermissionDenied {
                "\nHINT: Restoring ownership usually needs root; try --no-owner when extracting."
            } else {
                ""
            };
            anyhow!("I/O error on '{}': {source}{hint}", path.display())
        }
        ArchiveError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {io_err}",
                subject.display()
            )
        }
        _ => anyhow::Error::from(err)
            .context(format!("Error processing '{}'", subject.display())),
    }
}

/// Converts the error of `result`, naming `subject` in the message.
pub fn add_archive_context<T>(
    result: Result<T, ArchiveError>,
    subject: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_archive_error(e, subject))
}
