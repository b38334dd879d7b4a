//! Writing decoded entries to disk and restoring their metadata.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use filetime::FileTime;
use log::debug;

use crate::ArchiveError;
use crate::Result;
use crate::report::ExtractionReport;
use crate::types::DestDir;
use crate::types::EntryHeader;
use crate::types::EntryMetadata;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

struct DeferredDirectory {
    path: PathBuf,
    depth: usize,
    metadata: EntryMetadata,
}

/// Materializes entries under a destination directory.
///
/// Shared by all extraction workers. File metadata is restored as soon as
/// the content is written; directory metadata is collected and applied by
/// [`Materializer::finish`], deepest first, once every entry is on disk.
pub(crate) struct Materializer<'a> {
    dest: &'a DestDir,
    restore_ownership: bool,
    deferred: Mutex<Vec<DeferredDirectory>>,
    files: AtomicUsize,
    directories: AtomicUsize,
    bytes: AtomicU64,
}

impl<'a> Materializer<'a> {
    pub(crate) fn new(dest: &'a DestDir, restore_ownership: bool) -> Self {
        Self {
            dest,
            restore_ownership,
            deferred: Mutex::new(Vec::new()),
            files: AtomicUsize::new(0),
            directories: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    /// Writes a file entry from `body`, then restores its metadata.
    pub(crate) fn file<R: Read + ?Sized>(&self, header: &EntryHeader, body: &mut R) -> Result<()> {
        let target = self.dest.join(&header.name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ArchiveError::entry(parent, e))?;
            self.dest.ensure_contains(parent, &header.name)?;
        }

        // Never write through whatever already sits at the target.
        if let Ok(existing) = fs::symlink_metadata(&target)
            && !existing.is_dir()
        {
            fs::remove_file(&target).map_err(|e| ArchiveError::entry(&target, e))?;
        }

        let file = File::create(&target).map_err(|e| ArchiveError::entry(&target, e))?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
        let written = io::copy(body, &mut writer).map_err(|e| ArchiveError::entry(&target, e))?;
        writer
            .into_inner()
            .map_err(|e| ArchiveError::entry(&target, e.into_error()))?;

        restore_metadata(&target, &header.metadata, self.restore_ownership)?;

        debug!("extracted {} ({written} bytes)", header.name);
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(written, Ordering::Relaxed);
        Ok(())
    }

    /// Creates a directory entry and defers its metadata.
    pub(crate) fn directory(&self, header: &EntryHeader) -> Result<()> {
        let target = self.dest.join(&header.name);
        fs::create_dir_all(&target).map_err(|e| ArchiveError::entry(&target, e))?;
        self.dest.ensure_contains(&target, &header.name)?;

        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DeferredDirectory {
                path: target,
                depth: header.name.depth(),
                metadata: header.metadata,
            });
        self.directories.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Applies deferred directory metadata, deepest directories first.
    pub(crate) fn finish(self) -> Result<ExtractionReport> {
        let mut deferred = self
            .deferred
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        deferred.sort_by(|a, b| b.depth.cmp(&a.depth));
        for dir in &deferred {
            restore_metadata(&dir.path, &dir.metadata, self.restore_ownership)?;
        }

        Ok(ExtractionReport {
            files_extracted: self.files.into_inner(),
            directories_created: self.directories.into_inner(),
            bytes_written: self.bytes.into_inner(),
            ..ExtractionReport::default()
        })
    }
}

/// Restores ownership, then mode, then times.
///
/// chown clears setuid/setgid bits on most systems, so it runs before
/// chmod. Times go last because both earlier calls update ctime only.
#[cfg(unix)]
pub(crate) fn restore_metadata(
    path: &Path,
    metadata: &EntryMetadata,
    restore_ownership: bool,
) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if restore_ownership && (metadata.uid.is_some() || metadata.gid.is_some()) {
        std::os::unix::fs::chown(path, metadata.uid, metadata.gid)
            .map_err(|e| ArchiveError::entry(path, e))?;
    }
    fs::set_permissions(path, fs::Permissions::from_mode(metadata.mode & 0o7777))
        .map_err(|e| ArchiveError::entry(path, e))?;
    set_times(path, metadata)
}

/// Restores times, then the read-only flag derived from the mode.
#[cfg(not(unix))]
pub(crate) fn restore_metadata(
    path: &Path,
    metadata: &EntryMetadata,
    _restore_ownership: bool,
) -> Result<()> {
    set_times(path, metadata)?;
    let mut permissions = fs::metadata(path)
        .map_err(|e| ArchiveError::entry(path, e))?
        .permissions();
    permissions.set_readonly(metadata.mode & 0o222 == 0);
    fs::set_permissions(path, permissions).map_err(|e| ArchiveError::entry(path, e))
}

fn set_times(path: &Path, metadata: &EntryMetadata) -> Result<()> {
    filetime::set_file_times(
        path,
        FileTime::now(),
        FileTime::from_unix_time(metadata.mtime, 0),
    )
    .map_err(|e| ArchiveError::entry(path, e))
}
