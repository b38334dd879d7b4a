//! Canonical extraction target directory.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use super::ArchiveName;
use crate::ArchiveError;
use crate::Result;

/// The directory an archive is extracted into.
///
/// The path is created if missing and stored canonicalized, so joined
/// entry names can be checked with a plain prefix comparison.
///
/// # Examples
///
/// ```no_run
/// use treepack_core::types::{ArchiveName, DestDir};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::create("/tmp/restore")?;
/// let name = ArchiveName::parse("src/lib.rs")?;
/// let target = dest.join(&name);
/// assert!(target.starts_with(dest.as_path()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Creates the directory (recursively) if needed and canonicalizes it.
    ///
    /// # Errors
    ///
    /// Returns `Entry` if the directory cannot be created, is not a
    /// directory, or cannot be canonicalized.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|e| ArchiveError::entry(path, e))?;
        let canonical = path.canonicalize().map_err(|e| ArchiveError::entry(path, e))?;
        if !canonical.is_dir() {
            return Err(ArchiveError::entry(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }
        Ok(Self(canonical))
    }

    /// Returns the canonical path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolves an entry name under this directory.
    ///
    /// `ArchiveName` carries no `..` or root component, so the result is
    /// lexically inside the destination.
    #[must_use]
    pub fn join(&self, name: &ArchiveName) -> PathBuf {
        self.0.join(name.to_path())
    }

    /// Verifies that an existing directory still resolves inside the
    /// destination once symlinks are followed.
    ///
    /// # Errors
    ///
    /// - `PathTraversal` if `dir` resolves outside the destination
    /// - `Entry` if `dir` cannot be canonicalized
    pub fn ensure_contains(&self, dir: &Path, name: &ArchiveName) -> Result<()> {
        let resolved = dir.canonicalize().map_err(|e| ArchiveError::entry(dir, e))?;
        if resolved.starts_with(&self.0) {
            Ok(())
        } else {
            Err(ArchiveError::PathTraversal {
                name: name.to_string(),
            })
        }
    }
}
