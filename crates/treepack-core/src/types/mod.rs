//! Entry and path types shared by the codecs, writer and extractor.
//!
//! Names read from archives are validated when an [`ArchiveName`] is built,
//! so every later stage can join them onto a [`DestDir`] without re-checking
//! for traversal.

pub mod archive_name;
pub mod dest_dir;
pub mod entry;

pub use archive_name::ArchiveName;
pub use dest_dir::DestDir;
pub use entry::EntryHeader;
pub use entry::EntryKind;
pub use entry::EntryMetadata;
pub use entry::SourceEntry;
