//! Error types for archive creation and extraction.

use std::io;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Coarse classification of an [`ArchiveError`].
///
/// Request layers map this onto their own status codes; see
/// [`ErrorCategory::http_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The archive root or the archive file does not exist.
    NotFound,
    /// The requested format string is not recognized.
    UnsupportedFormat,
    /// Any other failure: I/O, malformed archive, rejected entry name.
    Io,
}

impl ErrorCategory {
    /// Returns the HTTP status a request layer would answer with.
    ///
    /// # Examples
    ///
    /// ```
    /// use treepack_core::ErrorCategory;
    ///
    /// assert_eq!(ErrorCategory::NotFound.http_status(), 404);
    /// assert_eq!(ErrorCategory::UnsupportedFormat.http_status(), 400);
    /// assert_eq!(ErrorCategory::Io.http_status(), 500);
    /// ```
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::UnsupportedFormat => 400,
            Self::Io => 500,
        }
    }
}

/// Errors that can occur while creating, listing or extracting archives.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Archive root or archive file does not exist.
    #[error("not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Format string is not one of the supported container formats.
    #[error("unsupported archive format: {format}")]
    UnsupportedFormat {
        /// The rejected format string.
        format: String,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// I/O operation on a specific entry failed.
    #[error("I/O error on {}: {source}", path.display())]
    Entry {
        /// Path of the entry on disk.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Archive is corrupted or invalid.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Entry name would resolve outside the extraction target.
    #[error("path traversal detected: {name}")]
    PathTraversal {
        /// The offending entry name as stored in the archive.
        name: String,
    },

    /// Configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for the rejection.
        reason: String,
    },

    /// Compression level outside 1-9.
    #[error("invalid compression level {level}, must be 1-9")]
    InvalidCompressionLevel {
        /// The rejected level.
        level: u8,
    },
}

impl ArchiveError {
    /// Wraps an I/O error with the path of the entry it occurred on.
    pub fn entry(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Entry {
            path: path.into(),
            source,
        }
    }

    /// Like [`ArchiveError::entry`], but a `NotFound` I/O error becomes
    /// [`ArchiveError::NotFound`].
    pub(crate) fn from_open(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::entry(path, source)
        }
    }

    /// Returns the category used to report this error to callers.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use treepack_core::{ArchiveError, ErrorCategory};
    ///
    /// let err = ArchiveError::NotFound {
    ///     path: PathBuf::from("missing"),
    /// };
    /// assert_eq!(err.category(), ErrorCategory::NotFound);
    ///
    /// let err = ArchiveError::InvalidArchive("truncated".to_string());
    /// assert_eq!(err.category(), ErrorCategory::Io);
    /// ```
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::UnsupportedFormat { .. } => ErrorCategory::UnsupportedFormat,
            _ => ErrorCategory::Io,
        }
    }

    /// Returns `true` if this error was raised for an entry name that
    /// escapes the extraction target.
    #[must_use]
    pub const fn is_path_traversal(&self) -> bool {
        matches!(self, Self::PathTraversal { .. })
    }

    /// Returns the on-disk path this error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path } | Self::Entry { path, .. } => Some(path),
            _ => None,
        }
    }
}
