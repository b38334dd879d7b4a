//! Operation reports.

use std::path::PathBuf;
use std::time::Duration;

use crate::ArchiveFormat;

/// Report of an archive creation operation.
///
/// # Examples
///
/// ```
/// use treepack_core::{ArchiveFormat, CreationReport};
///
/// let mut report = CreationReport::new("src.tar.gz".into(), ArchiveFormat::TarGz);
/// report.files_added = 10;
/// report.bytes_read = 1024;
/// report.bytes_written = 512;
///
/// assert_eq!(report.total_entries(), 10);
/// assert_eq!(report.compression_ratio(), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct CreationReport {
    /// Where the archive was written.
    pub archive_path: PathBuf,

    /// Container format of the archive.
    pub format: ArchiveFormat,

    /// Number of file entries written.
    pub files_added: usize,

    /// Number of directory entries written.
    pub directories_added: usize,

    /// Total content bytes read from disk (uncompressed).
    pub bytes_read: u64,

    /// Size of the finished archive on disk.
    pub bytes_written: u64,

    /// Duration of the creation operation.
    pub duration: Duration,
}

impl CreationReport {
    /// Creates an empty report for `archive_path`.
    #[must_use]
    pub fn new(archive_path: PathBuf, format: ArchiveFormat) -> Self {
        Self {
            archive_path,
            format,
            files_added: 0,
            directories_added: 0,
            bytes_read: 0,
            bytes_written: 0,
            duration: Duration::ZERO,
        }
    }

    /// Returns the number of entries in the archive.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.files_added + self.directories_added
    }

    /// Returns the compression ratio (uncompressed / archive size).
    ///
    /// Returns 0.0 if either side is 0.
    #[must_use]
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_written == 0 || self.bytes_read == 0 {
            return 0.0;
        }
        self.bytes_read as f64 / self.bytes_written as f64
    }
}

/// Report of an archive extraction operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Number of files written.
    pub files_extracted: usize,

    /// Number of directory entries materialized.
    pub directories_created: usize,

    /// Total content bytes written to disk.
    pub bytes_written: u64,

    /// Duration of the extraction operation.
    pub duration: Duration,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns total number of entries materialized.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created
    }
}
