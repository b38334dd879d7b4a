//! Configuration shared by archive creation and extraction.

use crate::ArchiveError;
use crate::Result;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Default number of entries buffered between producers and the sink.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Configuration for archive operations.
///
/// Controls the worker pool size, the depth of the bounded entry channel,
/// the compression level, and how entries are named and restored.
///
/// # Examples
///
/// ```
/// use treepack_core::ArchiveConfig;
///
/// let config = ArchiveConfig::default();
/// assert!(config.validate().is_ok());
///
/// let custom = ArchiveConfig::default()
///     .with_threads(2)
///     .with_compression_level(9)
///     .with_atomic_write(false);
/// assert_eq!(custom.threads, 2);
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Number of worker threads used for stat, read and extraction tasks.
    ///
    /// Default: available parallelism of the host, at least 1.
    pub threads: usize,

    /// Capacity of the bounded channel feeding the archive sink or the
    /// extraction workers. Also the size of the window of entries read
    /// concurrently during creation.
    ///
    /// Default: `64`.
    pub channel_capacity: usize,

    /// Compression level (1-9).
    ///
    /// `None` uses the codec default.
    ///
    /// Default: `Some(6)`.
    pub compression_level: Option<u8>,

    /// Directory stripped from absolute paths to form entry names.
    ///
    /// `None` means the parent directory of the archive root.
    ///
    /// Default: `None`.
    pub archive_root: Option<PathBuf>,

    /// Write the archive to a temporary file and rename it into place
    /// once it is complete.
    ///
    /// Default: `true`.
    pub atomic_write: bool,

    /// Restore uid/gid recorded in the archive when extracting.
    ///
    /// Default: `true`.
    pub restore_ownership: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            compression_level: Some(6),
            archive_root: None,
            atomic_write: true,
            restore_ownership: true,
        }
    }
}

impl ArchiveConfig {
    /// Creates a new `ArchiveConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker thread count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the bounded channel capacity.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Sets the compression level.
    ///
    /// # Panics
    ///
    /// Panics if the compression level is not in the range 1-9.
    /// Use `validate()` for non-panicking validation.
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        assert!((1..=9).contains(&level), "compression level must be 1-9");
        self.compression_level = Some(level);
        self
    }

    /// Sets the directory entry names are made relative to.
    #[must_use]
    pub fn with_archive_root(mut self, root: Option<PathBuf>) -> Self {
        self.archive_root = root;
        self
    }

    /// Sets whether the archive is written through a temporary file.
    #[must_use]
    pub fn with_atomic_write(mut self, atomic: bool) -> Self {
        self.atomic_write = atomic;
        self
    }

    /// Sets whether ownership is restored on extraction.
    #[must_use]
    pub fn with_restore_ownership(mut self, restore: bool) -> Self {
        self.restore_ownership = restore;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `threads` or `channel_capacity` is zero
    /// - Compression level is set but not in range 1-9
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ArchiveError::InvalidConfig {
                reason: "thread count must be at least 1".to_string(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(ArchiveError::InvalidConfig {
                reason: "channel capacity must be at least 1".to_string(),
            });
        }
        if let Some(level) = self.compression_level
            && !(1..=9).contains(&level)
        {
            return Err(ArchiveError::InvalidCompressionLevel { level });
        }
        Ok(())
    }
}
