//! Archive engine that packs file trees into tar.gz or zip and restores
//! them with their POSIX metadata.
//!
//! Creation walks the tree, stats and reads entries on a bounded worker
//! pool and streams them through a single sink thread that owns the
//! encoder. Extraction validates every entry name against the target
//! directory, writes entries in parallel and then restores ownership,
//! mode and modification time.
//!
//! # Examples
//!
//! ```no_run
//! use treepack_core::{create_archive, extract_archive};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = create_archive("data/photos", "tar.gz")?;
//! extract_archive(&archive, "tar.gz", "/restore")?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod codec;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod extract;
pub mod format;
pub mod inspect;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::create_archive;
pub use api::extract_archive;
pub use api::list_archive;
pub use config::ArchiveConfig;
pub use error::ArchiveError;
pub use error::ErrorCategory;
pub use error::Result;
pub use extract::ArchiveExtractor;
pub use format::ArchiveFormat;
pub use report::CreationReport;
pub use report::ExtractionReport;
pub use types::EntryHeader;
pub use types::EntryKind;
pub use types::EntryMetadata;
pub use writer::ArchiveWriter;
