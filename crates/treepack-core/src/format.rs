//! Supported container formats.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ArchiveError;
use crate::Result;

/// Archive container formats understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Gzip-compressed tar archive.
    TarGz,
    /// ZIP archive.
    Zip,
}

impl ArchiveFormat {
    /// Returns the canonical format string, which is also the file
    /// extension appended to the archive root.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }

    /// Returns the path the archive for `root` is written to:
    /// `root` with `.tar.gz` or `.zip` appended.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use treepack_core::ArchiveFormat;
    ///
    /// let path = ArchiveFormat::TarGz.archive_path_for(Path::new("data/src"));
    /// assert_eq!(path, PathBuf::from("data/src.tar.gz"));
    ///
    /// let path = ArchiveFormat::Zip.archive_path_for(Path::new("notes.txt"));
    /// assert_eq!(path, PathBuf::from("notes.txt.zip"));
    /// ```
    #[must_use]
    pub fn archive_path_for(self, root: &Path) -> PathBuf {
        // `components()` drops a trailing separator so "dir/" maps to "dir.zip".
        let mut path = OsString::from(root.components().as_path().as_os_str());
        path.push(".");
        path.push(self.as_str());
        PathBuf::from(path)
    }

    /// Detects the format from an archive file name.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if the extension is not recognized.
    pub fn detect(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else if name.ends_with(".zip") {
            Ok(Self::Zip)
        } else {
            Err(ArchiveError::UnsupportedFormat {
                format: path.display().to_string(),
            })
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            "zip" => Ok(Self::Zip),
            other => Err(ArchiveError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
