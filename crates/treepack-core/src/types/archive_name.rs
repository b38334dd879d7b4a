//! Validated archive entry names.

use std::fmt;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;

/// A normalized, archive-relative entry name.
///
/// Components are joined with `/`, there is no leading `/`, no trailing `/`,
/// and no `.` or `..` component. A name therefore always resolves strictly
/// inside whatever directory it is joined onto.
///
/// Names can only be built through [`ArchiveName::parse`] (read side) or
/// [`ArchiveName::from_relative_path`] (write side).
///
/// # Examples
///
/// ```
/// use treepack_core::types::ArchiveName;
///
/// let name = ArchiveName::parse("./src/lib.rs").unwrap();
/// assert_eq!(name.as_str(), "src/lib.rs");
///
/// let dir = ArchiveName::parse("src/nested/").unwrap();
/// assert_eq!(dir.as_str(), "src/nested");
/// assert_eq!(dir.depth(), 2);
///
/// assert!(ArchiveName::parse("../etc/passwd").is_err());
/// assert!(ArchiveName::parse("/etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveName(String);

impl ArchiveName {
    /// Parses a raw name read from an archive header.
    ///
    /// Empty and `.` components are dropped and a trailing `/` is ignored.
    /// Backslashes are treated as separators so names written on Windows
    /// cannot smuggle a `..` past validation.
    ///
    /// # Errors
    ///
    /// - `PathTraversal` if the name is absolute, carries a drive prefix or
    ///   contains a `..` component
    /// - `InvalidArchive` if the name is empty or contains a NUL byte
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.contains('\0') {
            return Err(ArchiveError::InvalidArchive(format!(
                "entry name contains NUL byte: {raw:?}"
            )));
        }
        if raw.starts_with('/') || raw.starts_with('\\') {
            return Err(ArchiveError::PathTraversal {
                name: raw.to_string(),
            });
        }

        let mut parts = Vec::new();
        for part in raw.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    return Err(ArchiveError::PathTraversal {
                        name: raw.to_string(),
                    });
                }
                // Drive-relative names like "C:foo" would resolve outside
                // the target on Windows.
                p if parts.is_empty() && is_drive_prefix(p) => {
                    return Err(ArchiveError::PathTraversal {
                        name: raw.to_string(),
                    });
                }
                p => parts.push(p),
            }
        }

        if parts.is_empty() {
            return Err(ArchiveError::InvalidArchive(format!(
                "empty entry name: {raw:?}"
            )));
        }
        Ok(Self(parts.join("/")))
    }

    /// Builds a name from a path already made relative to the archive root.
    ///
    /// # Errors
    ///
    /// - `PathTraversal` if the path is absolute or contains `..`
    /// - `InvalidArchive` if the path is empty
    /// - `Entry` if a component is not valid UTF-8
    pub fn from_relative_path(path: &Path) -> Result<Self> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        ArchiveError::entry(
                            path,
                            std::io::Error::new(
                                std::io::ErrorKind::InvalidData,
                                "path is not valid UTF-8",
                            ),
                        )
                    })?;
                    parts.push(part);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ArchiveError::PathTraversal {
                        name: path.display().to_string(),
                    });
                }
            }
        }

        if parts.is_empty() {
            return Err(ArchiveError::InvalidArchive(format!(
                "empty entry name for {}",
                path.display()
            )));
        }
        Ok(Self(parts.join("/")))
    }

    /// Returns the name as stored in archives (without trailing `/`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name with a trailing `/`, as directory entries are
    /// conventionally written.
    #[must_use]
    pub fn directory_form(&self) -> String {
        format!("{}/", self.0)
    }

    /// Number of path components.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }

    /// Converts the name to a relative filesystem path.
    #[must_use]
    pub fn to_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

fn is_drive_prefix(part: &str) -> bool {
    let bytes = part.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArchiveName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
