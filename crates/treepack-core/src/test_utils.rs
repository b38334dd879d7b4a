//! Fixtures shared by unit tests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;
use std::path::Path;

use crate::codec::PreparedEntry;
use crate::types::ArchiveName;
use crate::types::EntryHeader;
use crate::types::EntryKind;
use crate::types::EntryMetadata;
use crate::types::SourceEntry;

/// Stats `root/rel` as a source entry named `rel`.
pub fn source_entry(root: &Path, rel: &str) -> SourceEntry {
    SourceEntry::stat(&root.join(rel), root).unwrap().unwrap()
}

/// Builds a prepared entry without touching the filesystem.
pub fn prepared(name: &str, kind: EntryKind, mode: u32, data: &[u8]) -> PreparedEntry {
    PreparedEntry {
        name: ArchiveName::parse(name).unwrap(),
        kind,
        metadata: EntryMetadata {
            mode,
            uid: None,
            gid: None,
            mtime: 1_577_836_800,
        },
        data: data.to_vec(),
    }
}

/// Builds an entry header as a decoder would return it.
pub fn header(name: &str, kind: EntryKind, mode: u32, mtime: i64) -> EntryHeader {
    EntryHeader {
        name: ArchiveName::parse(name).unwrap(),
        kind,
        metadata: EntryMetadata {
            mode,
            uid: None,
            gid: None,
            mtime,
        },
        size: 0,
    }
}

/// Creates an in-memory tar archive with names written verbatim, so
/// fixtures can carry `..` or absolute names.
pub fn raw_tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        let raw = name.as_bytes();
        header.as_old_mut().name[..raw.len()].copy_from_slice(raw);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_577_836_800);
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Gzips `data`.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Creates an in-memory zip archive with names written verbatim and no
/// extra fields.
pub fn raw_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::write::ZipWriter;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);

    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Makes every directory under `root` writable again so `TempDir` can
/// remove it.
#[cfg(unix)]
pub fn make_writable(root: &Path) {
    use std::os::unix::fs::PermissionsExt;

    for entry in walkdir::WalkDir::new(root).into_iter().flatten() {
        if entry.file_type().is_dir() {
            let _ = std::fs::set_permissions(entry.path(), std::fs::Permissions::from_mode(0o755));
        }
    }
}
