//! Reading archive headers without extracting.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::Result;
use crate::codec::tar::TarDecoder;
use crate::codec::zip::ZipDecoder;
use crate::types::EntryHeader;

/// Returns the headers of every file and directory in `archive`, in
/// archive order. Links and special files are skipped as on extraction.
///
/// Tar archives are scanned sequentially, skipping content; zip archives
/// are read from the central directory. Names are validated exactly as
/// during extraction, so an archive that lists cleanly will not trip the
/// traversal check later.
///
/// # Errors
///
/// - `NotFound` if `archive` does not exist
/// - `PathTraversal` for an unsafe entry name
/// - `InvalidArchive` for malformed archives
pub fn list_entries(archive: &Path, format: ArchiveFormat) -> Result<Vec<EntryHeader>> {
    match format {
        ArchiveFormat::TarGz => {
            let file = File::open(archive).map_err(|e| ArchiveError::from_open(archive, e))?;
            let mut decoder = TarDecoder::new(GzDecoder::new(BufReader::new(file)));
            let headers = decoder
                .entries()?
                .map(|item| item.map(|(header, _body)| header))
                .collect::<Result<Vec<_>>>()?;
            Ok(headers)
        }
        ArchiveFormat::Zip => ZipDecoder::open(archive)?.headers(),
    }
}
