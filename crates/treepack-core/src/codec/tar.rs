//! Tar codec.
//!
//! The encoder writes GNU headers through `tar::Builder`; gzip is layered
//! around it by the caller. The decoder walks entries in archive order and
//! only yields regular files and directories.

use std::io::Read;
use std::io::Write;

use log::debug;
use log::warn;
use tar::Archive;
use tar::Builder;
use tar::Entries;
use tar::Entry;
use tar::EntryType;
use tar::Header;

use super::EntryEncoder;
use super::PreparedEntry;
use crate::ArchiveError;
use crate::Result;
use crate::types::ArchiveName;
use crate::types::EntryHeader;
use crate::types::EntryKind;
use crate::types::EntryMetadata;

/// Appends entries to a tar stream.
pub struct TarEncoder<W: Write> {
    builder: Builder<W>,
}

impl<W: Write> TarEncoder<W> {
    /// Wraps `writer`; nothing is written until the first append.
    pub fn new(writer: W) -> Self {
        Self {
            builder: Builder::new(writer),
        }
    }
}

impl<W: Write> EntryEncoder for TarEncoder<W> {
    type Output = W;

    fn append(&mut self, entry: &PreparedEntry) -> Result<()> {
        let mut header = Header::new_gnu();
        let path = match entry.kind {
            EntryKind::File => {
                header.set_entry_type(EntryType::Regular);
                header.set_size(entry.size());
                entry.name.as_str().to_string()
            }
            EntryKind::Directory => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                entry.name.directory_form()
            }
        };

        let metadata = &entry.metadata;
        header.set_mode(metadata.mode & 0o7777);
        header.set_uid(u64::from(metadata.uid.unwrap_or(0)));
        header.set_gid(u64::from(metadata.gid.unwrap_or(0)));
        // The octal mtime field is unsigned.
        let mtime = u64::try_from(metadata.mtime).unwrap_or_else(|_| {
            debug!(
                "mtime {} of {} predates 1970, stored as 0",
                metadata.mtime, entry.name
            );
            0
        });
        header.set_mtime(mtime);
        header.set_cksum();

        self.builder
            .append_data(&mut header, &path, entry.data.as_slice())
            .map_err(|e| ArchiveError::entry(entry.name.to_path(), e))
    }

    fn finish(self) -> Result<W> {
        Ok(self.builder.into_inner()?)
    }
}

/// Sequential reader over an uncompressed tar stream.
pub struct TarDecoder<R: Read> {
    archive: Archive<R>,
}

impl<R: Read> TarDecoder<R> {
    /// Wraps an already decompressed reader.
    pub fn new(reader: R) -> Self {
        Self {
            archive: Archive::new(reader),
        }
    }

    /// Iterates `(header, body)` pairs in archive order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchive` if the stream cannot be positioned.
    pub fn entries(&mut self) -> Result<TarEntries<'_, R>> {
        let inner = self
            .archive
            .entries()
            .map_err(|e| ArchiveError::InvalidArchive(format!("failed to read TAR entries: {e}")))?;
        Ok(TarEntries { inner })
    }
}

/// Iterator returned by [`TarDecoder::entries`].
///
/// Each body must be consumed (or dropped) before the next item is
/// requested; the tar crate skips any unread remainder.
pub struct TarEntries<'a, R: 'a + Read> {
    inner: Entries<'a, R>,
}

impl<'a, R: Read> Iterator for TarEntries<'a, R> {
    type Item = Result<(EntryHeader, Entry<'a, R>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    return Some(Err(ArchiveError::InvalidArchive(format!(
                        "failed to read TAR entry: {e}"
                    ))));
                }
            };
            match read_header(&entry) {
                Ok(Some(header)) => return Some(Ok((header, entry))),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn read_header<R: Read>(entry: &Entry<'_, R>) -> Result<Option<EntryHeader>> {
    let raw_path = entry.path_bytes();
    let raw_name = std::str::from_utf8(&raw_path)
        .map_err(|_| ArchiveError::InvalidArchive("entry name is not valid UTF-8".to_string()))?;

    let header = entry.header();
    let kind = match header.entry_type() {
        // Pre-POSIX archives mark directories only by the trailing slash.
        EntryType::Regular if raw_name.ends_with('/') => EntryKind::Directory,
        EntryType::Regular | EntryType::Continuous => EntryKind::File,
        EntryType::Directory => EntryKind::Directory,
        other => {
            warn!("skipping unsupported TAR entry type {other:?}: {raw_name}");
            return Ok(None);
        }
    };

    let name = ArchiveName::parse(raw_name)?;

    // Only the name and the framing are fatal. An unreadable owner is not
    // restored.
    let mode = header.mode().map_or_else(
        |e| {
            debug!("unreadable mode in header of {raw_name} ({e}), using default");
            kind.default_mode()
        },
        |mode| mode & 0o7777,
    );
    let uid = header.uid().ok().and_then(|id| u32::try_from(id).ok());
    let gid = header.gid().ok().and_then(|id| u32::try_from(id).ok());
    let mtime = header.mtime().map_or_else(
        |e| {
            debug!("unreadable mtime in header of {raw_name} ({e}), using epoch");
            0
        },
        |mtime| i64::try_from(mtime).unwrap_or(i64::MAX),
    );

    Ok(Some(EntryHeader {
        name,
        kind,
        metadata: EntryMetadata {
            mode,
            uid,
            gid,
            mtime,
        },
        size: if kind.is_file() { entry.size() } else { 0 },
    }))
}
