//! Tree enumeration.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use walkdir::WalkDir;

use crate::ArchiveError;
use crate::Result;
use crate::pool::WorkerPool;
use crate::types::SourceEntry;

/// Lists the entries to archive for `root`.
///
/// A file root yields itself. A directory root yields every descendant,
/// following symlinks, but not the root itself. Each path is stat'ed on
/// `pool` and named relative to `archive_root`. Sockets, FIFOs and device
/// nodes are skipped. The result is sorted by entry name, so a directory
/// always precedes its contents.
///
/// # Errors
///
/// - `NotFound` if `root` does not exist
/// - `Entry` for the first descendant that cannot be read or stat'ed
/// - `InvalidConfig` if a path lies outside `archive_root`
pub fn enumerate(root: &Path, archive_root: &Path, pool: &WorkerPool) -> Result<Vec<SourceEntry>> {
    let metadata = fs::metadata(root).map_err(|e| ArchiveError::from_open(root, e))?;

    let paths: Vec<PathBuf> = if metadata.is_dir() {
        WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.map(walkdir::DirEntry::into_path).map_err(walk_error))
            .collect::<Result<_>>()?
    } else {
        vec![root.to_path_buf()]
    };

    let stats = pool.try_map(&paths, |path| SourceEntry::stat(path, archive_root))?;
    let mut entries: Vec<SourceEntry> = stats.into_iter().flatten().collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    debug!(
        "enumerated {} entries under {} ({} skipped)",
        entries.len(),
        root.display(),
        paths.len() - entries.len()
    );
    Ok(entries)
}

fn walk_error(e: walkdir::Error) -> ArchiveError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
    let message = e.to_string();
    let source = e
        .into_io_error()
        .unwrap_or_else(|| io::Error::other(format!("walkdir error: {message}")));
    ArchiveError::entry(path, source)
}
