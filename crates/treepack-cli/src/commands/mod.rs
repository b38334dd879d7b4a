//! Subcommand implementations.

pub mod completion;
pub mod create;
pub mod extract;
pub mod list;

use std::path::Path;

use anyhow::Result;
use treepack_core::ArchiveFormat;

use crate::error::add_archive_context;

/// Resolves the `--format` argument, falling back to the archive's file
/// name.
fn resolve_format(explicit: Option<&str>, archive: &Path) -> Result<ArchiveFormat> {
    let format = match explicit {
        Some(format) => format.parse(),
        None => ArchiveFormat::detect(archive),
    };
    add_archive_context(format, archive)
}
