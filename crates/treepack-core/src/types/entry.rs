//! Archive entry model shared by the write and read sides.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use log::warn;

use super::ArchiveName;
use crate::ArchiveError;
use crate::Result;

/// Kind of entry stored in an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file with content.
    File,
    /// Directory, no content.
    Directory,
}

impl EntryKind {
    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::File)
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Permission bits used when an archive carries none.
    #[must_use]
    pub const fn default_mode(self) -> u32 {
        match self {
            Self::File => 0o644,
            Self::Directory => 0o755,
        }
    }
}

/// POSIX metadata captured per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Permission bits, masked with `0o7777`.
    pub mode: u32,
    /// Owner user id, if the archive records one.
    pub uid: Option<u32>,
    /// Owner group id, if the archive records one.
    pub gid: Option<u32>,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: i64,
}

impl EntryMetadata {
    /// Captures metadata from a filesystem stat.
    #[cfg(unix)]
    #[must_use]
    pub fn from_fs(metadata: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            mode: metadata.mode() & 0o7777,
            uid: Some(metadata.uid()),
            gid: Some(metadata.gid()),
            mtime: metadata.mtime(),
        }
    }

    /// Captures metadata from a filesystem stat.
    #[cfg(not(unix))]
    #[must_use]
    pub fn from_fs(metadata: &fs::Metadata) -> Self {
        let mode = if metadata.is_dir() {
            EntryKind::Directory.default_mode()
        } else if metadata.permissions().readonly() {
            0o444
        } else {
            EntryKind::File.default_mode()
        };
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .and_then(|d| i64::try_from(d.as_secs()).ok())
            .unwrap_or(0);

        Self {
            mode,
            uid: None,
            gid: None,
            mtime,
        }
    }
}

/// An entry discovered on disk, ready to be written to an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Absolute path of the entry on disk.
    pub path: PathBuf,
    /// Name the entry is stored under.
    pub name: ArchiveName,
    /// File or directory.
    pub kind: EntryKind,
    /// Metadata captured when the tree was enumerated.
    pub metadata: EntryMetadata,
    /// File size at enumeration time, 0 for directories.
    pub size: u64,
}

impl SourceEntry {
    /// Stats `path` and names it relative to `archive_root`.
    ///
    /// Returns `Ok(None)` for file types that cannot be archived
    /// (sockets, FIFOs, devices).
    ///
    /// # Errors
    ///
    /// - `Entry` if the stat fails
    /// - `InvalidConfig` if `path` is not under `archive_root`
    pub fn stat(path: &Path, archive_root: &Path) -> Result<Option<Self>> {
        let metadata = fs::metadata(path).map_err(|e| ArchiveError::entry(path, e))?;

        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else if metadata.is_file() {
            EntryKind::File
        } else {
            warn!("skipping unsupported file type: {}", path.display());
            return Ok(None);
        };

        let relative = path
            .strip_prefix(archive_root)
            .map_err(|_| ArchiveError::InvalidConfig {
                reason: format!(
                    "{} is not under archive root {}",
                    path.display(),
                    archive_root.display()
                ),
            })?;

        Ok(Some(Self {
            path: path.to_path_buf(),
            name: ArchiveName::from_relative_path(relative)?,
            kind,
            metadata: EntryMetadata::from_fs(&metadata),
            size: if kind.is_file() { metadata.len() } else { 0 },
        }))
    }
}

/// An entry header parsed from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// Validated entry name.
    pub name: ArchiveName,
    /// File or directory.
    pub kind: EntryKind,
    /// Metadata recorded in the archive.
    pub metadata: EntryMetadata,
    /// Uncompressed content size, 0 for directories.
    pub size: u64,
}
