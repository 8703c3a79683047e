//! Integration tests for the ZIP reader
//!
//! These tests cover the ZIP listing functionality including:
//! - Entry metadata extraction from real archives
//! - Directory detection and name normalization
//! - Corrupt and truncated input
//! - Parse options and progress reporting

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use zipdelta_parsers::{
    read_archive, ParseError, ParseOptions, ParsePhase, ParseProgress, Parser, ProgressCallback,
    ZipParser, DATE_FORMAT,
};

/// Helper to build an in-memory archive from (name, contents) pairs
fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    build_zip_with(files, |_| {})
}

fn build_zip_with<F>(files: &[(&str, &[u8])], finish: F) -> Vec<u8>
where
    F: FnOnce(&mut zip::ZipWriter<Cursor<Vec<u8>>>),
{
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::from_date_and_time(2024, 3, 15, 10, 30, 42).unwrap());

    for (name, contents) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
    }

    finish(&mut writer);
    writer.finish().unwrap().into_inner()
}

/// Offset of the first central directory header
fn central_directory_offset(data: &[u8]) -> usize {
    data.windows(4)
        .position(|w| w == [0x50, 0x4B, 0x01, 0x02])
        .expect("archive has a central directory")
}

/// Overwrite every occurrence of `from` with the equally long `to`
fn patch_bytes(data: &mut [u8], from: &[u8], to: &[u8]) {
    assert_eq!(from.len(), to.len());
    let mut i = 0;
    while i + from.len() <= data.len() {
        if &data[i..i + from.len()] == from {
            data[i..i + from.len()].copy_from_slice(to);
            i += from.len();
        } else {
            i += 1;
        }
    }
}

mod listing_tests {
    use super::*;

    #[test]
    fn test_file_metadata() {
        let data = build_zip(&[("project/docs/readme.txt", b"README for ZIP1")]);
        let archive = ZipParser::new().parse(Cursor::new(data)).unwrap();

        assert_eq!(archive.entry_count(), 1);
        let entry = archive.get("project/docs/readme.txt").unwrap();
        assert_eq!(entry.uncompressed_size, 15);
        assert_eq!(entry.crc32, crc32fast::hash(b"README for ZIP1"));
        assert!(!entry.is_directory);
        assert!(!entry.is_encrypted);
    }

    #[test]
    fn test_modification_time() {
        let data = build_zip(&[("a.txt", b"x")]);
        let archive = ZipParser::new().parse(Cursor::new(data)).unwrap();

        let entry = archive.get("a.txt").unwrap().to_archive_entry();
        let date = entry.modified_at.unwrap();
        assert_eq!(date.format(DATE_FORMAT).to_string(), "2024-03-15 10:30:42");
        assert_eq!(entry.display_date(), "2024-03-15 10:30:42");
        assert_eq!(entry.display_size(), "1 bytes");
    }

    #[test]
    fn test_explicit_directories() {
        let data = build_zip(&[
            ("data/", b""),
            ("data/images/", b""),
            ("data/images/icon.png", b"\x89PNG\r\nfakeimage"),
        ]);
        let archive = ZipParser::new().parse(Cursor::new(data)).unwrap();

        assert_eq!(archive.directory_count(), 2);
        assert_eq!(archive.file_count(), 1);
        assert!(archive.get("data/images/").unwrap().is_directory);
    }

    #[test]
    fn test_entry_map_keys_sorted() {
        let data = build_zip(&[
            ("zeta.txt", b"z"),
            ("alpha/beta.txt", b"b"),
            ("alpha.txt", b"a"),
        ]);
        let map = ZipParser::new().parse(Cursor::new(data)).unwrap().entry_map();

        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["alpha.txt", "alpha/beta.txt", "zeta.txt"]);
    }

    #[test]
    fn test_unicode_names() {
        let data = build_zip(&[("docs/guía de instalación.txt", b"v1")]);
        let archive = ZipParser::new().parse(Cursor::new(data)).unwrap();
        assert!(archive.contains("docs/guía de instalación.txt"));
    }

    #[test]
    fn test_legacy_names_decode_as_cp437() {
        // ASCII names are written without the UTF-8 flag
        let mut data = build_zip(&[("x1.txt", b"one"), ("x2.txt", b"two")]);
        patch_bytes(&mut data, b"x1.txt", b"x\x82.txt");
        patch_bytes(&mut data, b"x2.txt", b"x\x83.txt");

        let archive = ZipParser::new().parse(Cursor::new(data)).unwrap();
        assert_eq!(archive.entry_count(), 2);
        let keys: Vec<_> = archive.entry_map().into_keys().collect();
        assert_eq!(keys, vec!["xâ.txt", "xé.txt"]);
    }

    #[test]
    fn test_leading_stub() {
        let stub = b"#!/bin/sh\necho self-extracting\nexit 0\n";
        let mut data = stub.to_vec();
        data.extend_from_slice(&build_zip(&[("a.txt", b"1"), ("dir/b.txt", b"2")]));

        let archive = ZipParser::new().parse(Cursor::new(data)).unwrap();
        assert_eq!(archive.entry_count(), 2);
        assert_eq!(
            archive.get("a.txt").map(|e| e.local_header_offset),
            Some(stub.len() as u64)
        );
        assert_eq!(
            archive.get("dir/b.txt").map(|e| e.crc32),
            Some(crc32fast::hash(b"2"))
        );
    }

    #[test]
    fn test_leading_stub_with_strict_validation() {
        let mut data = b"SFX".to_vec();
        data.extend_from_slice(&build_zip(&[("a.txt", b"1")]));
        let options = ParseOptions {
            strict_validation: true,
            ..Default::default()
        };

        let archive = ZipParser::new()
            .parse_with_options(Cursor::new(data), &options, None)
            .unwrap();
        assert!(archive.contains("a.txt"));
    }

    #[test]
    fn test_archive_comment() {
        let data = build_zip_with(&[("a.txt", b"x")], |w| {
            w.set_comment("built for the listing test");
        });
        let archive = ZipParser::new().parse(Cursor::new(data)).unwrap();
        assert_eq!(archive.entry_count(), 1);
    }

    #[test]
    fn test_empty_archive() {
        let data = build_zip(&[]);
        let archive = ZipParser::new().parse(Cursor::new(data)).unwrap();
        assert_eq!(archive.entry_count(), 0);
        assert!(archive.entry_map().is_empty());
    }
}

mod corruption_tests {
    use super::*;

    #[test]
    fn test_truncated_archive() {
        let data = build_zip(&[("a.txt", b"hello"), ("b.txt", b"world")]);
        let truncated = data[..data.len() - 10].to_vec();

        let result = ZipParser::new().parse(Cursor::new(truncated));
        assert!(result.is_err());
    }

    #[test]
    fn test_corrupt_central_directory_signature() {
        let mut data = build_zip(&[("a.txt", b"hello")]);
        let offset = central_directory_offset(&data);
        data[offset + 2] = 0xFF;

        let err = ZipParser::new().parse(Cursor::new(data)).unwrap_err();
        match err {
            ParseError::Nested { context, source } => {
                assert_eq!(context, "central directory entry 0");
                assert!(matches!(*source, ParseError::InvalidMagic { .. }));
            }
            other => panic!("Expected Nested error, got {other:?}"),
        }
    }

    #[test]
    fn test_not_a_zip() {
        let data = b"PK\x03\x04 but nothing resembling a central directory follows".to_vec();
        let err = ZipParser::new().parse(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut data = build_zip(&[("a.txt", b"hello")]);
        let offset = central_directory_offset(&data);
        // "version needed to extract" follows signature and "version made by"
        data[offset + 6] = 99;

        let err = ZipParser::new().parse(Cursor::new(data)).unwrap_err();
        assert!(err.to_string().contains("Unsupported version: 99"));
    }
}

mod options_tests {
    use super::*;

    #[test]
    fn test_max_entries() {
        let data = build_zip(&[("a.txt", b"1"), ("b.txt", b"2"), ("c.txt", b"3")]);
        let options = ParseOptions {
            max_entries: 2,
            ..Default::default()
        };

        let err = ZipParser::new()
            .parse_with_options(Cursor::new(data), &options, None)
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure(_)));
    }

    #[test]
    fn test_strict_validation_accepts_well_formed() {
        let data = build_zip(&[("a.txt", b"1"), ("dir/b.txt", b"2")]);
        let options = ParseOptions {
            strict_validation: true,
            ..Default::default()
        };

        let archive = ZipParser::new()
            .parse_with_options(Cursor::new(data), &options, None)
            .unwrap();
        assert_eq!(archive.entry_count(), 2);
    }

    #[test]
    fn test_progress_reports_completion() {
        let data = build_zip(&[("a.txt", b"1"), ("b.txt", b"2")]);
        let completed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&completed);

        let callback: ProgressCallback = Box::new(move |p: ParseProgress| {
            if p.phase == ParsePhase::Complete {
                seen.store(p.items_processed as usize, Ordering::SeqCst);
            }
        });

        ZipParser::new()
            .parse_with_options(Cursor::new(data), &ParseOptions::default(), Some(callback))
            .unwrap();
        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }
}

mod file_tests {
    use super::*;

    #[test]
    fn test_read_archive_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test1.zip");
        std::fs::write(&path, build_zip(&[("data/config.json", b"{\"version\": \"1.0\"}")]))
            .unwrap();

        let entries = read_archive(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["data/config.json"].size, Some(18));
    }

    #[test]
    fn test_read_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_archive(&dir.path().join("missing.zip")).unwrap_err();
        match err {
            ParseError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("Expected I/O error, got {other:?}"),
        }
    }

    #[test]
    fn test_can_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_extension");
        std::fs::write(&path, build_zip(&[("a.txt", b"1")])).unwrap();

        let parser = ZipParser::new();
        assert!(parser.can_parse(&path));
        assert!(parser.can_parse(std::path::Path::new("whatever.ZIP")));
        assert_eq!(parser.magic_bytes(), Some(&[0x50, 0x4B, 0x03, 0x04][..]));
    }
}

// Property-based tests using proptest
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_listing_matches_written_names(
            names in prop::collection::btree_set("[a-z]{1,6}(/[a-z]{1,6}){0,2}\\.txt", 0..12)
        ) {
            let files: Vec<(&str, &[u8])> = names.iter().map(|n| (n.as_str(), &b"data"[..])).collect();
            let map = ZipParser::new().parse(Cursor::new(build_zip(&files))).unwrap().entry_map();

            let listed: Vec<_> = map.keys().cloned().collect();
            let expected: Vec<_> = names.iter().cloned().collect();
            prop_assert_eq!(listed, expected);
        }

        #[test]
        fn test_arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..512)) {
            let _ = ZipParser::new().parse(Cursor::new(data));
        }
    }
}
