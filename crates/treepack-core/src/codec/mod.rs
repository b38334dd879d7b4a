//! Container codecs.
//!
//! Both formats share the write-side [`EntryEncoder`] seam consumed by the
//! sink pipeline. The read sides differ on purpose: tar is a sequential
//! iterator over one stream, zip is random access over its central
//! directory and extracts in parallel through [`zip::extract_to`].

pub mod tar;
pub mod zip;
mod zip_fields;

use std::fs;

use crate::ArchiveError;
use crate::Result;
use crate::types::ArchiveName;
use crate::types::EntryKind;
use crate::types::EntryMetadata;
use crate::types::SourceEntry;

/// An entry whose content has been read and is ready to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEntry {
    /// Name stored in the archive.
    pub name: ArchiveName,
    /// File or directory.
    pub kind: EntryKind,
    /// Metadata written to the entry header.
    pub metadata: EntryMetadata,
    /// File content, empty for directories.
    pub data: Vec<u8>,
}

impl PreparedEntry {
    /// Reads the content of a source entry.
    ///
    /// Files are read whole; directories carry no content.
    ///
    /// # Errors
    ///
    /// Returns `Entry` if the file cannot be read.
    pub fn load(source: &SourceEntry) -> Result<Self> {
        let data = match source.kind {
            EntryKind::File => {
                fs::read(&source.path).map_err(|e| ArchiveError::entry(&source.path, e))?
            }
            EntryKind::Directory => Vec::new(),
        };
        Ok(Self {
            name: source.name.clone(),
            kind: source.kind,
            metadata: source.metadata,
            data,
        })
    }

    /// Content length recorded in the header.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Write side of a container format.
///
/// Implementations are owned by exactly one thread; `append` is called in
/// archive order and `finish` writes the trailing structures.
pub trait EntryEncoder {
    /// What the encoder hands back once finalized, usually the inner writer.
    type Output;

    /// Appends one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the header or content cannot be written.
    fn append(&mut self, entry: &PreparedEntry) -> Result<()>;

    /// Writes the end-of-archive structures and releases the writer.
    ///
    /// # Errors
    ///
    /// Returns an error if finalization fails.
    fn finish(self) -> Result<Self::Output>;
}

/// Converts a user compression level (1-9) to a flate2 level.
///
/// `None` selects flate2's default; a set level is passed through as is.
#[must_use]
pub fn compression_level_to_flate2(level: Option<u8>) -> flate2::Compression {
    level.map_or_else(flate2::Compression::default, |n| {
        flate2::Compression::new(u32::from(n))
    })
}
