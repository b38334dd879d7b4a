//! Archive creation.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use flate2::write::GzEncoder;
use log::debug;
use log::info;
use tempfile::TempPath;

use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::Result;
use crate::codec::EntryEncoder;
use crate::codec::PreparedEntry;
use crate::codec::compression_level_to_flate2;
use crate::codec::tar::TarEncoder;
use crate::codec::zip::ZipEncoder;
use crate::enumerate::enumerate;
use crate::pipeline::SinkPipeline;
use crate::pool::WorkerPool;
use crate::report::CreationReport;
use crate::types::EntryKind;
use crate::types::SourceEntry;

const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Creates archives according to an [`ArchiveConfig`].
///
/// # Examples
///
/// ```no_run
/// use treepack_core::{ArchiveConfig, ArchiveWriter};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let writer = ArchiveWriter::new(ArchiveConfig::default().with_compression_level(9));
/// let report = writer.create("project".as_ref(), "zip")?;
/// println!("wrote {}", report.archive_path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArchiveWriter {
    config: ArchiveConfig,
}

impl ArchiveWriter {
    /// Creates a writer with `config`.
    #[must_use]
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Archives `root` next to itself, parsing `format` first.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` if `format` is unknown (no file is produced)
    /// - see [`ArchiveWriter::create_format`]
    pub fn create(&self, root: &Path, format: &str) -> Result<CreationReport> {
        let format: ArchiveFormat = format.parse()?;
        self.create_format(root, format)
    }

    /// Archives `root` into `root` + `.tar.gz` / `.zip`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` / `InvalidCompressionLevel` for a bad configuration
    /// - `NotFound` if `root` does not exist
    /// - `Entry` for the first entry that cannot be stat'ed or read
    /// - `Io` if the archive cannot be written
    pub fn create_format(&self, root: &Path, format: ArchiveFormat) -> Result<CreationReport> {
        self.config.validate()?;
        let start = Instant::now();

        let canonical_root = root
            .canonicalize()
            .map_err(|e| ArchiveError::from_open(root, e))?;
        let archive_root = self.archive_root_for(&canonical_root)?;
        let archive_path = format.archive_path_for(root);
        let pool = WorkerPool::new(self.config.threads)?;

        let entries = enumerate(&canonical_root, &archive_root, &pool)?;
        debug!(
            "writing {} entries to {} with {} workers",
            entries.len(),
            archive_path.display(),
            pool.threads()
        );

        let mut report = CreationReport::new(archive_path.clone(), format);
        let (file, output) = ArchiveOutput::create(&archive_path, self.config.atomic_write)?;
        let written = self.write_entries(file, format, &entries, &pool, &mut report);
        let file = match written {
            Ok(file) => file,
            Err(e) => {
                output.discard();
                return Err(e);
            }
        };

        file.sync_all()?;
        report.bytes_written = file.metadata()?.len();
        drop(file);
        output.commit()?;
        report.duration = start.elapsed();

        info!(
            "created {} ({} files, {} directories, {} bytes) in {:.2?}",
            archive_path.display(),
            report.files_added,
            report.directories_added,
            report.bytes_written,
            report.duration
        );
        Ok(report)
    }

    fn archive_root_for(&self, canonical_root: &Path) -> Result<PathBuf> {
        match &self.config.archive_root {
            Some(dir) => dir.canonicalize().map_err(|e| ArchiveError::InvalidConfig {
                reason: format!("archive root {} is not usable: {e}", dir.display()),
            }),
            None => Ok(canonical_root
                .parent()
                .unwrap_or(canonical_root)
                .to_path_buf()),
        }
    }

    fn write_entries(
        &self,
        file: File,
        format: ArchiveFormat,
        entries: &[SourceEntry],
        pool: &WorkerPool,
        report: &mut CreationReport,
    ) -> Result<File> {
        let buffered = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
        let buffered = match format {
            ArchiveFormat::TarGz => {
                let level = compression_level_to_flate2(self.config.compression_level);
                let encoder = TarEncoder::new(GzEncoder::new(buffered, level));
                self.stream(encoder, entries, pool, report)?.finish()?
            }
            ArchiveFormat::Zip => {
                let encoder = ZipEncoder::new(buffered, self.config.compression_level);
                self.stream(encoder, entries, pool, report)?
            }
        };
        buffered
            .into_inner()
            .map_err(|e| ArchiveError::Io(e.into_error()))
    }

    /// Reads entries window by window on the pool and feeds them, in
    /// order, to the sink thread owning `encoder`.
    fn stream<E>(
        &self,
        encoder: E,
        entries: &[SourceEntry],
        pool: &WorkerPool,
        report: &mut CreationReport,
    ) -> Result<E::Output>
    where
        E: EntryEncoder + Send + 'static,
        E::Output: Send + 'static,
    {
        let window = self.config.channel_capacity.max(1);
        let mut pipeline = SinkPipeline::spawn(encoder, window)?;

        for chunk in entries.chunks(window) {
            let prepared = pool.try_map(chunk, PreparedEntry::load)?;
            for entry in prepared {
                match entry.kind {
                    EntryKind::File => {
                        report.files_added += 1;
                        report.bytes_read += entry.size();
                    }
                    EntryKind::Directory => report.directories_added += 1,
                }
                pipeline.send(entry)?;
            }
        }
        pipeline.finish()
    }
}

/// Destination of an archive being written.
enum ArchiveOutput {
    /// Written under a temporary name, renamed on commit.
    Staged { temp: TempPath, target: PathBuf },
    /// Written in place.
    Direct { target: PathBuf },
}

impl ArchiveOutput {
    fn create(target: &Path, atomic: bool) -> Result<(File, Self)> {
        if !atomic {
            let file = File::create(target).map_err(|e| ArchiveError::entry(target, e))?;
            return Ok((
                file,
                Self::Direct {
                    target: target.to_path_buf(),
                },
            ));
        }

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(".treepack-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(|e| ArchiveError::entry(dir, e))?;
        let (file, temp) = temp.into_parts();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Temporary files are created 0600; archives get the usual 0644.
            file.set_permissions(std::fs::Permissions::from_mode(0o644))?;
        }

        Ok((
            file,
            Self::Staged {
                temp,
                target: target.to_path_buf(),
            },
        ))
    }

    fn commit(self) -> Result<()> {
        match self {
            Self::Staged { temp, target } => temp
                .persist(&target)
                .map_err(|e| ArchiveError::entry(&target, e.error)),
            Self::Direct { .. } => Ok(()),
        }
    }

    fn discard(self) {
        match self {
            // TempPath removes the file on drop.
            Self::Staged { .. } => {}
            Self::Direct { target } => {
                if let Err(e) = std::fs::remove_file(&target) {
                    debug!("could not remove partial archive {}: {e}", target.display());
                }
            }
        }
    }
}
