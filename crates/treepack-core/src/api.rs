//! High-level entry points using the default configuration.

use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveExtractor;
use crate::ArchiveFormat;
use crate::ArchiveWriter;
use crate::Result;
use crate::inspect::list_entries;
use crate::types::EntryHeader;

/// Archives `root` and returns the path of the new archive.
///
/// `format` is `"tar.gz"` (or `"tgz"`) or `"zip"`. The archive is written
/// next to `root` as `root.tar.gz` / `root.zip`, and entry names start at
/// the last component of `root`.
///
/// # Errors
///
/// Returns an error if:
/// - `format` is not supported (nothing is written)
/// - `root` does not exist
/// - an entry cannot be stat'ed or read
/// - the archive cannot be written
///
/// # Examples
///
/// ```no_run
/// use treepack_core::create_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let archive = create_archive("project/src", "tar.gz")?;
/// assert!(archive.ends_with("src.tar.gz"));
/// # Ok(())
/// # }
/// ```
pub fn create_archive<P: AsRef<Path>>(root: P, format: &str) -> Result<PathBuf> {
    ArchiveWriter::default()
        .create(root.as_ref(), format)
        .map(|report| report.archive_path)
}

/// Extracts `archive` into `target`, restoring content, mode, ownership
/// and modification times.
///
/// # Errors
///
/// Returns an error if:
/// - `format` is not supported (nothing is touched)
/// - `archive` does not exist
/// - an entry name would escape `target`
/// - the archive is malformed
/// - an entry cannot be written or its metadata restored
///
/// # Examples
///
/// ```no_run
/// use treepack_core::extract_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// extract_archive("backup.zip", "zip", "/tmp/restore")?;
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive: P,
    format: &str,
    target: Q,
) -> Result<()> {
    ArchiveExtractor::default()
        .extract(archive.as_ref(), format, target.as_ref())
        .map(|_| ())
}

/// Lists the entry headers of `archive` without extracting it.
///
/// # Errors
///
/// Returns an error if `format` is not supported, `archive` does not
/// exist, an entry name is unsafe, or the archive is malformed.
pub fn list_archive<P: AsRef<Path>>(archive: P, format: &str) -> Result<Vec<EntryHeader>> {
    let format: ArchiveFormat = format.parse()?;
    list_entries(archive.as_ref(), format)
}
