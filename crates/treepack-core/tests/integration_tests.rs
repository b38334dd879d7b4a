//! End-to-end tests for archive creation and extraction.
//!
//! Each test builds a real tree under a temp dir, archives it, extracts it
//! somewhere else and compares what comes back.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use filetime::FileTime;
use tempfile::TempDir;
use walkdir::WalkDir;
use treepack_core::ArchiveConfig;
use treepack_core::ArchiveError;
use treepack_core::ArchiveExtractor;
use treepack_core::ArchiveFormat;
use treepack_core::ArchiveWriter;
use treepack_core::EntryKind;
use treepack_core::ErrorCategory;
use treepack_core::create_archive;
use treepack_core::extract_archive;
use treepack_core::list_archive;

const FORMATS: [&str; 2] = ["tar.gz", "zip"];

/// Builds `root/src` with nested files, an empty directory and fixed mtimes.
fn build_tree(root: &Path) -> PathBuf {
    let src = root.join("src");
    fs::create_dir_all(src.join("nested/deeper")).unwrap();
    fs::create_dir_all(src.join("empty")).unwrap();
    fs::write(src.join("top.txt"), b"top level").unwrap();
    fs::write(src.join("nested/mid.bin"), vec![7u8; 70_000]).unwrap();
    fs::write(src.join("nested/deeper/leaf.txt"), b"leaf").unwrap();

    set_mtime(&src.join("top.txt"), 1_600_000_000);
    set_mtime(&src.join("nested/mid.bin"), 1_600_000_100);
    set_mtime(&src.join("nested/deeper/leaf.txt"), 1_600_000_200);
    set_mtime(&src.join("nested/deeper"), 1_500_000_000);
    set_mtime(&src.join("nested"), 1_500_000_100);
    set_mtime(&src.join("empty"), 1_500_000_200);
    src
}

fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

fn mtime(path: &Path) -> i64 {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap()).unix_seconds()
}

/// Relative names under `root`, directories suffixed with `/`.
fn relative_files(root: &Path) -> Vec<String> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            if entry.file_type().is_dir() {
                format!("{rel}/")
            } else {
                rel
            }
        })
        .collect()
}

#[test]
fn test_round_trip_content_and_mtime() {
    for format in FORMATS {
        let temp = TempDir::new().unwrap();
        let src = build_tree(temp.path());

        let archive = create_archive(&src, format).unwrap();
        assert_eq!(archive, format.parse::<ArchiveFormat>().unwrap().archive_path_for(&src));
        assert!(archive.is_file());

        let out = temp.path().join("out");
        extract_archive(&archive, format, &out).unwrap();

        let restored = out.join("src");
        assert_eq!(relative_files(&restored), relative_files(&src), "{format}");
        assert_eq!(fs::read(restored.join("top.txt")).unwrap(), b"top level");
        assert_eq!(
            fs::read(restored.join("nested/mid.bin")).unwrap(),
            vec![7u8; 70_000]
        );

        for rel in [
            "top.txt",
            "nested/mid.bin",
            "nested/deeper/leaf.txt",
            "nested/deeper",
            "nested",
            "empty",
        ] {
            assert_eq!(
                mtime(&restored.join(rel)),
                mtime(&src.join(rel)),
                "{format}: mtime of {rel}"
            );
        }
    }
}

#[cfg(unix)]
#[test]
fn test_round_trip_mode_and_owner() {
    use std::os::unix::fs::MetadataExt;
    use std::os::unix::fs::PermissionsExt;

    for format in FORMATS {
        let temp = TempDir::new().unwrap();
        let src = build_tree(temp.path());
        fs::set_permissions(src.join("top.txt"), fs::Permissions::from_mode(0o600)).unwrap();
        fs::set_permissions(
            src.join("nested/deeper/leaf.txt"),
            fs::Permissions::from_mode(0o751),
        )
        .unwrap();
        fs::set_permissions(src.join("empty"), fs::Permissions::from_mode(0o700)).unwrap();

        let archive = create_archive(&src, format).unwrap();
        let out = temp.path().join("out");
        extract_archive(&archive, format, &out).unwrap();

        for rel in ["top.txt", "nested/deeper/leaf.txt", "nested/mid.bin", "empty", "nested"] {
            let before = fs::metadata(src.join(rel)).unwrap();
            let after = fs::metadata(out.join("src").join(rel)).unwrap();
            assert_eq!(after.mode() & 0o7777, before.mode() & 0o7777, "{format}: {rel}");
            assert_eq!(after.uid(), before.uid(), "{format}: {rel}");
            assert_eq!(after.gid(), before.gid(), "{format}: {rel}");
        }
    }
}

#[test]
fn test_single_file_archive() {
    for format in FORMATS {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("dir");
        fs::create_dir(&dir).unwrap();
        let file = dir.join("file.txt");
        fs::write(&file, b"solo").unwrap();

        let archive = create_archive(&file, format).unwrap();
        assert_eq!(
            archive.file_name().unwrap().to_str().unwrap(),
            format!("file.txt.{format}")
        );

        let entries = list_archive(&archive, format).unwrap();
        assert_eq!(entries.len(), 1, "{format}");
        assert_eq!(entries[0].name.as_str(), "file.txt");
        assert_eq!(entries[0].kind, EntryKind::File);

        let out = temp.path().join("out");
        extract_archive(&archive, format, &out).unwrap();
        assert_eq!(fs::read(out.join("file.txt")).unwrap(), b"solo");
    }
}

#[test]
fn test_empty_directory_preserved() {
    for format in FORMATS {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(root.join("hollow")).unwrap();

        let archive = create_archive(&root, format).unwrap();
        let entries = list_archive(&archive, format).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name.as_str(), "root/hollow");
        assert_eq!(entries[0].kind, EntryKind::Directory);

        let out = temp.path().join("out");
        extract_archive(&archive, format, &out).unwrap();
        let hollow = out.join("root/hollow");
        assert!(hollow.is_dir());
        assert_eq!(fs::read_dir(hollow).unwrap().count(), 0);
    }
}

#[test]
fn test_unsupported_format_creates_nothing() {
    let temp = TempDir::new().unwrap();
    let src = build_tree(temp.path());

    let err = create_archive(&src, "rar").unwrap_err();
    assert!(matches!(err, ArchiveError::UnsupportedFormat { .. }));
    assert_eq!(err.category(), ErrorCategory::UnsupportedFormat);
    assert!(!temp.path().join("src.rar").exists());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn test_missing_root_is_not_found() {
    let temp = TempDir::new().unwrap();
    for format in FORMATS {
        let err = create_archive(temp.path().join("absent"), format).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.category().http_status(), 404);
    }
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_archive_is_not_found() {
    let temp = TempDir::new().unwrap();
    for format in FORMATS {
        let err = extract_archive(temp.path().join("nope"), format, temp.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound { .. }));
    }
}

#[test]
fn test_entry_names_are_sorted_and_rooted() {
    for format in FORMATS {
        let temp = TempDir::new().unwrap();
        let src = build_tree(temp.path());
        let archive = create_archive(&src, format).unwrap();

        let names: Vec<String> = list_archive(&archive, format)
            .unwrap()
            .into_iter()
            .map(|h| h.name.to_string())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.iter().all(|n| n.starts_with("src/")));
        assert_eq!(
            names,
            [
                "src/empty",
                "src/nested",
                "src/nested/deeper",
                "src/nested/deeper/leaf.txt",
                "src/nested/mid.bin",
                "src/top.txt",
            ]
        );
    }
}

#[test]
fn test_explicit_archive_root() {
    let temp = TempDir::new().unwrap();
    let src = build_tree(temp.path());
    let config = ArchiveConfig::default().with_archive_root(Some(src.clone()));

    let report = ArchiveWriter::new(config).create(&src, "zip").unwrap();
    let entries = list_archive(&report.archive_path, "zip").unwrap();
    assert!(entries.iter().any(|h| h.name.as_str() == "top.txt"));
    assert!(entries.iter().all(|h| !h.name.as_str().starts_with("src")));
}

/// Tar with the deepest entries first and no entry for some parents.
fn reversed_tar() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut append = |name: &str, kind: tar::EntryType, mode: u32, data: &[u8]| {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(kind);
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_mtime(1_400_000_000);
        builder.append_data(&mut header, name, data).unwrap();
    };
    append("a/b/c/leaf.txt", tar::EntryType::Regular, 0o644, b"leaf");
    append("a/b/c/", tar::EntryType::Directory, 0o750, b"");
    append("x/y/orphan.txt", tar::EntryType::Regular, 0o600, b"orphan");
    append("a/", tar::EntryType::Directory, 0o755, b"");
    gzip(&builder.into_inner().unwrap())
}

fn gzip(tar: &[u8]) -> Vec<u8> {
    let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    std::io::Write::write_all(&mut gz, tar).unwrap();
    gz.finish().unwrap()
}

/// Same layout as [`reversed_tar`], as a zip.
fn reversed_zip() -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let file = SimpleFileOptions::default().unix_permissions(0o644);
    zip.start_file("a/b/c/leaf.txt", file).unwrap();
    zip.write_all(b"leaf").unwrap();
    zip.add_directory("a/b/c/", file.unix_permissions(0o750)).unwrap();
    zip.start_file("x/y/orphan.txt", file.unix_permissions(0o600)).unwrap();
    zip.write_all(b"orphan").unwrap();
    zip.add_directory("a/", file.unix_permissions(0o755)).unwrap();
    zip.finish().unwrap().into_inner()
}

#[test]
fn test_extraction_is_order_independent() {
    let temp = TempDir::new().unwrap();
    let tgz = temp.path().join("rev.tar.gz");
    let zip = temp.path().join("rev.zip");
    fs::write(&tgz, reversed_tar()).unwrap();
    fs::write(&zip, reversed_zip()).unwrap();

    for (archive, format) in [(&tgz, "tar.gz"), (&zip, "zip")] {
        for threads in [1, 4] {
            let out = temp.path().join(format!("out-{format}-{threads}"));
            let extractor =
                ArchiveExtractor::new(ArchiveConfig::default().with_threads(threads));
            let report = extractor.extract(archive, format, &out).unwrap();

            assert_eq!(report.files_extracted, 2, "{format}");
            assert_eq!(report.directories_created, 2, "{format}");
            assert_eq!(fs::read(out.join("a/b/c/leaf.txt")).unwrap(), b"leaf");
            assert_eq!(fs::read(out.join("x/y/orphan.txt")).unwrap(), b"orphan");

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mode = fs::metadata(out.join("a/b/c")).unwrap().permissions().mode();
                assert_eq!(mode & 0o7777, 0o750, "{format}");
            }
        }
    }
}

#[test]
fn test_creation_report_counts() {
    for format in FORMATS {
        let temp = TempDir::new().unwrap();
        let src = build_tree(temp.path());
        let writer = ArchiveWriter::new(ArchiveConfig::default().with_threads(2));
        let report = writer.create(&src, format).unwrap();

        assert_eq!(report.files_added, 3);
        assert_eq!(report.directories_added, 3);
        assert_eq!(report.bytes_read, 9 + 70_000 + 4);
        assert_eq!(
            report.bytes_written,
            fs::metadata(&report.archive_path).unwrap().len()
        );
        assert!(report.compression_ratio() > 1.0);
    }
}

#[cfg(unix)]
#[test]
fn test_read_only_entries_restored() {
    use std::os::unix::fs::PermissionsExt;

    for format in FORMATS {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("locked");
        fs::create_dir_all(root.join("inner")).unwrap();
        fs::write(root.join("inner/ro.txt"), b"frozen").unwrap();
        fs::set_permissions(root.join("inner/ro.txt"), fs::Permissions::from_mode(0o444)).unwrap();
        fs::set_permissions(root.join("inner"), fs::Permissions::from_mode(0o555)).unwrap();

        let archive = create_archive(&root, format).unwrap();
        let out = temp.path().join("out");
        let result = extract_archive(&archive, format, &out);

        let inner = out.join("locked/inner");
        let mode = |p: &Path| fs::metadata(p).map(|m| m.permissions().mode() & 0o7777);
        let dir_mode = mode(&inner);
        let file_mode = mode(&inner.join("ro.txt"));
        let content = fs::read(inner.join("ro.txt"));

        for dir in [&root.join("inner"), &inner] {
            let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o755));
        }

        result.unwrap();
        assert_eq!(dir_mode.unwrap(), 0o555, "{format}");
        assert_eq!(file_mode.unwrap(), 0o444, "{format}");
        assert_eq!(content.unwrap(), b"frozen");
    }
}

#[test]
fn test_extract_into_existing_target_overwrites_files() {
    let temp = TempDir::new().unwrap();
    let src = build_tree(temp.path());
    let archive = create_archive(&src, "tar.gz").unwrap();

    let out = temp.path().join("out");
    fs::create_dir_all(out.join("src")).unwrap();
    fs::write(out.join("src/top.txt"), b"stale content that is longer").unwrap();

    extract_archive(&archive, "tar.gz", &out).unwrap();
    assert_eq!(fs::read(out.join("src/top.txt")).unwrap(), b"top level");
}

#[test]
fn test_non_atomic_write() {
    let temp = TempDir::new().unwrap();
    let src = build_tree(temp.path());
    let writer = ArchiveWriter::new(ArchiveConfig::default().with_atomic_write(false));

    let report = writer.create(&src, "tar.gz").unwrap();
    let entries = list_archive(&report.archive_path, "tar.gz").unwrap();
    assert_eq!(entries.len(), 6);
}

/// Ustar blocks written byte by byte with only name, mode, size, mtime and
/// type filled in. Owner fields stay NUL.
fn minimal_ustar(entries: &[(&str, u8, u32, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for &(name, typeflag, mode, data) in entries {
        let mut block = [0u8; 512];
        block[..name.len()].copy_from_slice(name.as_bytes());
        block[100..108].copy_from_slice(format!("{mode:07o}\0").as_bytes());
        block[124..136].copy_from_slice(format!("{:011o}\0", data.len()).as_bytes());
        block[136..148].copy_from_slice(format!("{:011o}\0", 1_600_000_000).as_bytes());
        block[156] = typeflag;
        block[257..263].copy_from_slice(b"ustar\0");
        block[263..265].copy_from_slice(b"00");
        block[148..156].fill(b' ');
        let sum: u32 = block.iter().map(|&b| u32::from(b)).sum();
        block[148..156].copy_from_slice(format!("{sum:06o}\0 ").as_bytes());

        out.extend_from_slice(&block);
        out.extend_from_slice(data);
        out.resize(out.len().next_multiple_of(512), 0);
    }
    out.resize(out.len() + 1024, 0);
    out
}

#[test]
fn test_minimal_tar_headers_extract() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("minimal.tar.gz");
    let tar = minimal_ustar(&[
        ("bare/", b'5', 0o750, b""),
        ("bare/file.txt", b'0', 0o640, b"minimal"),
    ]);
    fs::write(&archive, gzip(&tar)).unwrap();

    let entries = list_archive(&archive, "tar.gz").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, EntryKind::Directory);
    for entry in &entries {
        assert_eq!(entry.metadata.uid, None, "{}", entry.name);
        assert_eq!(entry.metadata.gid, None, "{}", entry.name);
        assert_eq!(entry.metadata.mtime, 1_600_000_000, "{}", entry.name);
    }

    let out = temp.path().join("out");
    let report = ArchiveExtractor::default()
        .extract(&archive, "tar.gz", &out)
        .unwrap();
    assert_eq!(report.files_extracted, 1);
    assert_eq!(report.directories_created, 1);
    assert_eq!(fs::read(out.join("bare/file.txt")).unwrap(), b"minimal");
    assert_eq!(mtime(&out.join("bare/file.txt")), 1_600_000_000);
    assert_eq!(mtime(&out.join("bare")), 1_600_000_000);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode(&out.join("bare/file.txt")), 0o640);
        assert_eq!(mode(&out.join("bare")), 0o750);
    }
}

#[test]
fn test_long_names_round_trip() {
    for format in FORMATS {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("long");
        let deep = root.join("a".repeat(60)).join("b".repeat(60));
        fs::create_dir_all(&deep).unwrap();
        let file = deep.join(format!("{}.txt", "c".repeat(60)));
        fs::write(&file, b"deep").unwrap();
        set_mtime(&file, 1_600_000_000);

        let archive = create_archive(&root, format).unwrap();
        let rel = format!("long/{}/{}/{}.txt", "a".repeat(60), "b".repeat(60), "c".repeat(60));
        let entries = list_archive(&archive, format).unwrap();
        assert!(entries.iter().any(|h| h.name.as_str() == rel), "{format}");

        let out = temp.path().join("out");
        extract_archive(&archive, format, &out).unwrap();
        assert_eq!(fs::read(out.join(&rel)).unwrap(), b"deep", "{format}");
        assert_eq!(mtime(&out.join(&rel)), 1_600_000_000, "{format}");
    }
}

/// One `<len> <key>=<value>\n` record; the length counts its own digits.
fn pax_record(key: &str, value: &str) -> Vec<u8> {
    let body = format!(" {key}={value}\n");
    let mut len = body.len();
    loop {
        let total = body.len() + len.to_string().len();
        if total == len {
            break;
        }
        len = total;
    }
    format!("{len}{body}").into_bytes()
}

/// A pax archive whose real name lives only in the extended header.
fn pax_tar(name: &str, data: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let records = pax_record("path", name);
    let mut pax = tar::Header::new_ustar();
    pax.set_entry_type(tar::EntryType::XHeader);
    pax.set_size(records.len() as u64);
    pax.set_mode(0o644);
    builder
        .append_data(&mut pax, "PaxHeaders/entry", records.as_slice())
        .unwrap();

    let mut header = tar::Header::new_ustar();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o600);
    header.set_mtime(1_600_000_000);
    builder.append_data(&mut header, "placeholder", data).unwrap();
    builder.into_inner().unwrap()
}

#[test]
fn test_pax_path_extension_extracts() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("pax.tar.gz");
    let name = format!("pax/{}/payload.txt", "p".repeat(120));
    fs::write(&archive, gzip(&pax_tar(&name, b"from pax"))).unwrap();

    let entries = list_archive(&archive, "tar.gz").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name.as_str(), name);
    assert_eq!(entries[0].metadata.uid, None);

    let out = temp.path().join("out");
    extract_archive(&archive, "tar.gz", &out).unwrap();
    assert_eq!(fs::read(out.join(&name)).unwrap(), b"from pax");
    assert!(!out.join("placeholder").exists());
    assert_eq!(mtime(&out.join(&name)), 1_600_000_000);
}

#[test]
fn test_zip_symlinks_are_not_extracted() {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("links.zip");
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("kept.txt", options.unix_permissions(0o644)).unwrap();
    zip.write_all(b"kept").unwrap();
    zip.add_symlink("escape", "/etc/passwd", options).unwrap();
    fs::write(&archive, zip.finish().unwrap().into_inner()).unwrap();

    let entries = list_archive(&archive, "zip").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name.as_str(), "kept.txt");

    let out = temp.path().join("out");
    extract_archive(&archive, "zip", &out).unwrap();
    assert_eq!(fs::read(out.join("kept.txt")).unwrap(), b"kept");
    assert!(fs::symlink_metadata(out.join("escape")).is_err());
}
