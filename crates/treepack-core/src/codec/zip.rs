//! Zip codec.
//!
//! Entries carry their Unix mode in the external attributes, the exact
//! mtime in an extended timestamp field and uid/gid in an Info-ZIP Unix
//! field. The DOS timestamp is kept for tools that read nothing else.

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::path::Path;

use log::debug;
use log::warn;
use rayon::prelude::*;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::FullFileOptions;

use super::EntryEncoder;
use super::PreparedEntry;
use super::zip_fields;
use super::zip_fields::ExtraFields;
use crate::ArchiveError;
use crate::Result;
use crate::extract::Materializer;
use crate::pool::WorkerPool;
use crate::report::ExtractionReport;
use crate::types::ArchiveName;
use crate::types::DestDir;
use crate::types::EntryHeader;
use crate::types::EntryKind;
use crate::types::EntryMetadata;

/// Appends entries to a zip archive.
///
/// The external attributes only hold the 0o777 permission bits, so
/// setuid, setgid and sticky bits are dropped on the way in.
pub struct ZipEncoder<W: Write + Seek> {
    zip: ZipWriter<W>,
    compression_level: Option<u8>,
}

impl<W: Write + Seek> ZipEncoder<W> {
    /// Wraps `writer`. Files are deflated at `compression_level`.
    pub fn new(writer: W, compression_level: Option<u8>) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            compression_level,
        }
    }

    fn options(&self, entry: &PreparedEntry) -> Result<FullFileOptions<'static>> {
        let metadata = &entry.metadata;
        let mut options = FullFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.compression_level.map(i64::from))
            .unix_permissions(metadata.mode & 0o7777)
            .last_modified_time(zip_fields::dos_datetime(metadata.mtime));

        options
            .add_extra_data(
                zip_fields::EXTENDED_TIMESTAMP_ID,
                zip_fields::extended_timestamp(metadata.mtime),
                false,
            )
            .map_err(|e| write_error(&entry.name, "add timestamp field", &e))?;
        if let (Some(uid), Some(gid)) = (metadata.uid, metadata.gid) {
            options
                .add_extra_data(
                    zip_fields::UNIX_OWNER_ID,
                    zip_fields::unix_owner(uid, gid),
                    false,
                )
                .map_err(|e| write_error(&entry.name, "add owner field", &e))?;
        }
        Ok(options)
    }
}

impl<W: Write + Seek> EntryEncoder for ZipEncoder<W> {
    type Output = W;

    fn append(&mut self, entry: &PreparedEntry) -> Result<()> {
        let options = self.options(entry)?;
        match entry.kind {
            EntryKind::Directory => self
                .zip
                .add_directory(entry.name.directory_form(), options)
                .map_err(|e| write_error(&entry.name, "add directory", &e)),
            EntryKind::File => {
                self.zip
                    .start_file(entry.name.as_str(), options)
                    .map_err(|e| write_error(&entry.name, "start file", &e))?;
                self.zip
                    .write_all(&entry.data)
                    .map_err(|e| ArchiveError::entry(entry.name.to_path(), e))
            }
        }
    }

    fn finish(self) -> Result<W> {
        self.zip.finish().map_err(|e| {
            ArchiveError::Io(std::io::Error::other(format!(
                "failed to finish ZIP archive: {e}"
            )))
        })
    }
}

fn write_error(name: &ArchiveName, action: &str, e: &ZipError) -> ArchiveError {
    ArchiveError::entry(
        name.to_path(),
        std::io::Error::other(format!("failed to {action}: {e}")),
    )
}

fn read_error(e: ZipError) -> ArchiveError {
    match e {
        ZipError::Io(io) => ArchiveError::Io(io),
        other => ArchiveError::InvalidArchive(format!("failed to read ZIP archive: {other}")),
    }
}

/// Unix file type bits in the upper half of the external attributes.
const S_IFMT: u32 = 0o170_000;
const S_IFREG: u32 = 0o100_000;
const S_IFDIR: u32 = 0o040_000;

/// Classifies an entry from its directory flag and Unix mode.
///
/// A missing or zero file type is a regular file, as written by tools that
/// only record permissions. Links and special files yield `None`.
fn entry_kind(is_dir: bool, unix_mode: Option<u32>) -> Option<EntryKind> {
    if is_dir {
        return Some(EntryKind::Directory);
    }
    match unix_mode.map(|mode| mode & S_IFMT) {
        None | Some(0 | S_IFREG) => Some(EntryKind::File),
        Some(S_IFDIR) => Some(EntryKind::Directory),
        Some(_) => None,
    }
}

/// Random-access reader over a zip central directory.
#[derive(Debug)]
pub struct ZipDecoder<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl ZipDecoder<BufReader<File>> {
    /// Opens the archive at `path` and reads its central directory.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `path` does not exist
    /// - `InvalidArchive` if the central directory cannot be parsed
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ArchiveError::from_open(path, e))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipDecoder<R> {
    /// Reads the central directory from `reader`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchive` if the central directory cannot be parsed.
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader).map_err(|e| {
            ArchiveError::InvalidArchive(format!("failed to open ZIP archive: {e}"))
        })?;
        Ok(Self { archive })
    }

    /// Number of entries in the central directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Returns `true` if the archive has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Parses the header of entry `index`, or `None` if the entry is a
    /// link or special file.
    ///
    /// # Errors
    ///
    /// Returns `PathTraversal` for unsafe names, `InvalidArchive` for
    /// unreadable records.
    pub fn header(&mut self, index: usize) -> Result<Option<EntryHeader>> {
        Ok(self.entry(index)?.map(|(header, _)| header))
    }

    /// Parses every header, failing on the first unsafe name. Skipped
    /// entries are left out.
    ///
    /// # Errors
    ///
    /// See [`ZipDecoder::header`].
    pub fn headers(&mut self) -> Result<Vec<EntryHeader>> {
        Ok(self
            .indexed_headers()?
            .into_iter()
            .map(|(_, header)| header)
            .collect())
    }

    /// Like [`ZipDecoder::headers`], paired with each entry's index in the
    /// central directory.
    ///
    /// # Errors
    ///
    /// See [`ZipDecoder::header`].
    pub fn indexed_headers(&mut self) -> Result<Vec<(usize, EntryHeader)>> {
        (0..self.len())
            .filter_map(|index| {
                self.header(index)
                    .transpose()
                    .map(|header| header.map(|header| (index, header)))
            })
            .collect()
    }

    /// Returns the header of entry `index` and a reader over its
    /// decompressed content. Links and special files are skipped with a
    /// warning and yield `None`.
    ///
    /// # Errors
    ///
    /// See [`ZipDecoder::header`].
    pub fn entry(&mut self, index: usize) -> Result<Option<(EntryHeader, impl Read + '_)>> {
        let file = self.archive.by_index(index).map_err(read_error)?;

        let name = ArchiveName::parse(file.name())?;
        let Some(kind) = entry_kind(file.is_dir(), file.unix_mode()) else {
            warn!(
                "skipping unsupported ZIP entry type {:o}: {name}",
                file.unix_mode().unwrap_or(0) & S_IFMT
            );
            return Ok(None);
        };
        let fields = ExtraFields::parse(file.extra_data().unwrap_or_default());
        let mtime = fields
            .mtime
            .or_else(|| file.last_modified().and_then(zip_fields::unix_seconds))
            .unwrap_or(0);
        let header = EntryHeader {
            name,
            kind,
            metadata: EntryMetadata {
                mode: file.unix_mode().map_or(kind.default_mode(), |m| m & 0o7777),
                uid: fields.uid,
                gid: fields.gid,
                mtime,
            },
            size: if kind.is_file() { file.size() } else { 0 },
        };

        Ok(Some((header, file)))
    }
}

/// Extracts a zip archive under `dest` in one call.
///
/// Every entry name is validated against the destination before anything
/// is written. Entries are then materialized in parallel on `pool`; each
/// worker reads through its own handle on the archive file.
///
/// # Errors
///
/// Returns the first error hit while validating, writing or restoring
/// metadata. Entries already written stay on disk.
pub fn extract_to(
    archive_path: &Path,
    dest: &DestDir,
    pool: &WorkerPool,
    restore_ownership: bool,
) -> Result<ExtractionReport> {
    let headers = ZipDecoder::open(archive_path)?.indexed_headers()?;
    debug!(
        "extracting {} ZIP entries into {}",
        headers.len(),
        dest.as_path().display()
    );

    let materializer = Materializer::new(dest, restore_ownership);
    pool.install(|| {
        headers.par_iter().try_for_each_init(
            || ZipDecoder::open(archive_path),
            |decoder, (index, header)| {
                if header.kind.is_directory() {
                    return materializer.directory(header);
                }
                let decoder = decoder.as_mut().map_err(|e| {
                    ArchiveError::InvalidArchive(format!("failed to reopen ZIP archive: {e}"))
                })?;
                match decoder.entry(*index)? {
                    Some((header, mut body)) => materializer.file(&header, &mut body),
                    None => Ok(()),
                }
            },
        )
    })?;
    materializer.finish()
}
