//! Archive extraction.
//!
//! [`ArchiveExtractor`] dispatches on the format: tar.gz goes through a
//! parser thread feeding the worker pool, zip through
//! [`crate::codec::zip::extract_to`]. Both share the [`Materializer`]
//! that writes entries and restores their metadata.

mod materialize;
mod tar_gz;

use std::fs;
use std::path::Path;
use std::time::Instant;

use log::debug;
use log::info;

pub(crate) use materialize::Materializer;

use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::Result;
use crate::codec;
use crate::pool::WorkerPool;
use crate::report::ExtractionReport;
use crate::types::DestDir;

/// Extracts archives according to an [`ArchiveConfig`].
///
/// # Examples
///
/// ```no_run
/// use treepack_core::{ArchiveConfig, ArchiveExtractor};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = ArchiveExtractor::new(ArchiveConfig::default().with_threads(4));
/// let report = extractor.extract("backup.tar.gz".as_ref(), "tar.gz", "restore".as_ref())?;
/// println!("{} files restored", report.files_extracted);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArchiveExtractor {
    config: ArchiveConfig,
}

impl ArchiveExtractor {
    /// Creates an extractor with `config`.
    #[must_use]
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Extracts `archive` into `target`, parsing `format` first.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` if `format` is unknown (nothing is touched)
    /// - see [`ArchiveExtractor::extract_format`]
    pub fn extract(&self, archive: &Path, format: &str, target: &Path) -> Result<ExtractionReport> {
        let format: ArchiveFormat = format.parse()?;
        self.extract_format(archive, format, target)
    }

    /// Extracts `archive` into `target`.
    ///
    /// The target is created if missing. Extraction is not transactional:
    /// on failure, entries already written stay on disk.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` / `InvalidCompressionLevel` for a bad configuration
    /// - `NotFound` if `archive` does not exist
    /// - `PathTraversal` if an entry name escapes `target`
    /// - `InvalidArchive` for malformed archives
    /// - `Entry` / `Io` for filesystem failures
    pub fn extract_format(
        &self,
        archive: &Path,
        format: ArchiveFormat,
        target: &Path,
    ) -> Result<ExtractionReport> {
        self.config.validate()?;
        fs::metadata(archive).map_err(|e| ArchiveError::from_open(archive, e))?;

        let start = Instant::now();
        let dest = DestDir::create(target)?;
        let pool = WorkerPool::new(self.config.threads)?;
        debug!(
            "extracting {} ({format}) into {} with {} workers",
            archive.display(),
            dest.as_path().display(),
            pool.threads()
        );

        let mut report = match format {
            ArchiveFormat::TarGz => tar_gz::extract_tar_gz(
                archive,
                &dest,
                &pool,
                self.config.channel_capacity,
                self.config.restore_ownership,
            )?,
            ArchiveFormat::Zip => {
                codec::zip::extract_to(archive, &dest, &pool, self.config.restore_ownership)?
            }
        };
        report.duration = start.elapsed();

        info!(
            "extracted {} files and {} directories from {} in {:.2?}",
            report.files_extracted,
            report.directories_created,
            archive.display(),
            report.duration
        );
        Ok(report)
    }
}
