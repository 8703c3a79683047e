// zipdelta-parsers/src/zip/mod.rs
//! ZIP Archive Reader
//!
//! Reads the table of contents of a ZIP archive. Only the central directory
//! is consulted; member data is never read or decompressed, so listing works
//! for any compression method and for encrypted members. Everything is
//! located from the end record, so archives with leading data (for example
//! self-extracting stubs) list like any other.
//!
//! # Format Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! |                         ZIP Archive                         |
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │        Local headers + file data (not read here)        ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │           Central Directory (Entries)                   ││
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐                    ││
//! │  │  │ Entry 1 │ │ Entry 2 │ │ Entry N │ ...                ││
//! │  │  └─────────┘ └─────────┘ └─────────┘                    ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │   ZIP64 End of Central Directory + Locator (optional)   ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │            End of Central Directory                     ││
//! │  │  - Signature (0x06054B50)                               ││
//! │  │  - Central Directory offset                             ││
//! │  │  - Total entries count                                  ││
//! │  └─────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod archive;
mod cp437;
mod entry;

pub use archive::{ArchiveStatistics, ZipArchive};
pub use entry::{entry_map, ArchiveEntry, EntryMap, ZipEntry, DATE_FORMAT};

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::traits::{
    ParseError, ParseOptions, ParsePhase, ParseProgress, ParseResult, Parser, ProgressCallback,
};

/// Magic bytes at the start of a non-empty ZIP archive
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04]; // "PK\x03\x04"

/// End of central directory signature
const EOCD_SIGNATURE: u32 = 0x06054B50;

/// Central directory file header signature
const CD_SIGNATURE: u32 = 0x02014B50;

/// ZIP64 end of central directory record signature
const ZIP64_EOCD_SIGNATURE: u32 = 0x06064B50;

/// ZIP64 end of central directory locator signature
const ZIP64_EOCD_LOCATOR_SIGNATURE: u32 = 0x07064B50;

/// Fixed part of the end of central directory record
const EOCD_MIN_SIZE: u64 = 22;

/// Largest archive comment a ZIP file can carry
const MAX_COMMENT_LEN: u64 = 0xFFFF;

/// Size of the ZIP64 end of central directory locator
const ZIP64_LOCATOR_SIZE: u64 = 20;

/// Size of a ZIP64 end of central directory record without extensible data
const ZIP64_EOCD_SIZE: u64 = 56;

/// Highest "version needed to extract" understood (6.3)
const MAX_VERSION_NEEDED: u16 = 63;

/// General purpose flag: file name is UTF-8
const FLAG_UTF8: u16 = 0x0800;

/// General purpose flag: entry is encrypted
const FLAG_ENCRYPTED: u16 = 0x0001;

/// DOS attribute bit marking a directory
const DOS_DIRECTORY_ATTR: u32 = 0x10;

/// Compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Store,
    Deflate,
    Deflate64,
    Bzip2,
    Lzma,
    Zstd,
    Xz,
    Aes,
    Unknown(u16),
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Store,
            8 => CompressionMethod::Deflate,
            9 => CompressionMethod::Deflate64,
            12 => CompressionMethod::Bzip2,
            14 => CompressionMethod::Lzma,
            93 => CompressionMethod::Zstd,
            95 => CompressionMethod::Xz,
            99 => CompressionMethod::Aes,
            other => CompressionMethod::Unknown(other),
        }
    }
}

/// ZIP central directory reader
///
/// Stateless; every call reads the archive afresh.
#[derive(Debug, Default)]
pub struct ZipParser;

impl ZipParser {
    /// Create a new ZIP parser
    pub fn new() -> Self {
        Self
    }

    /// Parse the end of central directory record
    fn parse_eocd<R: Read + Seek>(
        &self,
        reader: &mut R,
        file_size: u64,
    ) -> ParseResult<EndOfCentralDirectory> {
        // EOCD is at least 22 bytes, search the tail that may hold a comment
        let search_start = file_size.saturating_sub(MAX_COMMENT_LEN + EOCD_MIN_SIZE);
        reader.seek(SeekFrom::Start(search_start))?;

        let mut buffer = vec![0u8; (file_size - search_start) as usize];
        reader.read_exact(&mut buffer)?;

        // Only positions with a full fixed record behind them are candidates
        let candidates = &buffer[..buffer.len() - (EOCD_MIN_SIZE as usize - 4)];
        let sig_bytes = EOCD_SIGNATURE.to_le_bytes();
        let eocd_pos = candidates
            .windows(4)
            .rposition(|w| w == sig_bytes)
            .ok_or_else(|| {
                ParseError::InvalidStructure("end of central directory record not found".into())
            })?;
        let eocd_offset = search_start + eocd_pos as u64;

        let mut record = Cursor::new(&buffer[eocd_pos + 4..]);
        let disk_number = record.read_u16::<LittleEndian>()?;
        let cd_disk = record.read_u16::<LittleEndian>()?;
        let _disk_entries = record.read_u16::<LittleEndian>()?;
        let total_entries = record.read_u16::<LittleEndian>()?;
        let cd_size = record.read_u32::<LittleEndian>()?;
        let cd_offset = record.read_u32::<LittleEndian>()?;
        let comment_length = record.read_u16::<LittleEndian>()?;

        let mut eocd = EndOfCentralDirectory {
            offset: eocd_offset,
            prefix: 0,
            disk_number: u32::from(disk_number),
            cd_disk: u32::from(cd_disk),
            total_entries: u64::from(total_entries),
            cd_size: u64::from(cd_size),
            cd_offset: u64::from(cd_offset),
            comment_length,
        };

        if cd_offset == 0xFFFF_FFFF || cd_size == 0xFFFF_FFFF || total_entries == 0xFFFF {
            self.parse_zip64_eocd(reader, &mut eocd)?;
        }

        // Leading data (self-extractor stubs, concatenation) shifts every
        // stored offset by the gap between where the directory claims to
        // end and where its end record actually sits
        let cd_end = eocd.cd_offset.checked_add(eocd.cd_size).ok_or_else(|| {
            ParseError::CorruptedData {
                offset: eocd.offset,
                message: "central directory bounds overflow".into(),
            }
        })?;
        eocd.prefix = eocd.offset.checked_sub(cd_end).ok_or_else(|| ParseError::CorruptedData {
            offset: eocd.cd_offset,
            message: "central directory extends past its end record".into(),
        })?;
        eocd.cd_offset += eocd.prefix;
        if eocd.prefix > 0 {
            tracing::debug!(prefix = eocd.prefix, "Archive is preceded by leading data");
        }

        Ok(eocd)
    }

    /// Apply the ZIP64 end of central directory, if the archive has one
    ///
    /// Saturated 32-bit fields are legal in a plain archive (exactly 65535
    /// entries, for instance), so ZIP64 is only used when its locator sits
    /// right before the end record.
    fn parse_zip64_eocd<R: Read + Seek>(
        &self,
        reader: &mut R,
        eocd: &mut EndOfCentralDirectory,
    ) -> ParseResult<()> {
        let Some(locator_offset) = eocd.offset.checked_sub(ZIP64_LOCATOR_SIZE) else {
            return Ok(());
        };
        reader.seek(SeekFrom::Start(locator_offset))?;
        if reader.read_u32::<LittleEndian>()? != ZIP64_EOCD_LOCATOR_SIGNATURE {
            tracing::debug!("Saturated end record without ZIP64 locator, using 32-bit values");
            return Ok(());
        }
        let _eocd_disk = reader.read_u32::<LittleEndian>()?;
        let recorded_offset = reader.read_u64::<LittleEndian>()?;

        // The record normally sits right before its locator; the recorded
        // offset is only trusted when it does not, as it ignores leading data
        let record_offset = match locator_offset.checked_sub(ZIP64_EOCD_SIZE) {
            Some(adjacent) if self.signature_at(reader, adjacent)? == ZIP64_EOCD_SIGNATURE => {
                adjacent
            }
            _ => recorded_offset,
        };

        reader.seek(SeekFrom::Start(record_offset))?;
        let sig = reader.read_u32::<LittleEndian>()?;
        if sig != ZIP64_EOCD_SIGNATURE {
            return Err(ParseError::InvalidMagic {
                expected: ZIP64_EOCD_SIGNATURE.to_le_bytes().to_vec(),
                found: sig.to_le_bytes().to_vec(),
            });
        }

        let _record_size = reader.read_u64::<LittleEndian>()?;
        let _version_made = reader.read_u16::<LittleEndian>()?;
        let _version_needed = reader.read_u16::<LittleEndian>()?;
        eocd.disk_number = reader.read_u32::<LittleEndian>()?;
        eocd.cd_disk = reader.read_u32::<LittleEndian>()?;
        let _disk_entries = reader.read_u64::<LittleEndian>()?;
        eocd.total_entries = reader.read_u64::<LittleEndian>()?;
        eocd.cd_size = reader.read_u64::<LittleEndian>()?;
        eocd.cd_offset = reader.read_u64::<LittleEndian>()?;
        // The central directory ends where the ZIP64 record begins
        eocd.offset = record_offset;

        Ok(())
    }

    fn signature_at<R: Read + Seek>(&self, reader: &mut R, offset: u64) -> ParseResult<u32> {
        reader.seek(SeekFrom::Start(offset))?;
        Ok(reader.read_u32::<LittleEndian>()?)
    }

    /// Parse central directory entries
    fn parse_central_directory<R: Read + Seek>(
        &self,
        reader: &mut R,
        eocd: &EndOfCentralDirectory,
        options: &ParseOptions,
        progress: Option<&ProgressCallback>,
    ) -> ParseResult<Vec<ZipEntry>> {
        reader.seek(SeekFrom::Start(eocd.cd_offset))?;

        let mut entries = Vec::with_capacity(eocd.total_entries.min(65_536) as usize);

        for i in 0..eocd.total_entries {
            let mut entry = self
                .parse_cd_entry(reader)
                .map_err(|e| e.with_context(format!("central directory entry {}", i)))?;
            entry.local_header_offset = entry.local_header_offset.saturating_add(eocd.prefix);

            if options.strict_validation && entry.local_header_offset >= eocd.cd_offset {
                return Err(ParseError::CorruptedData {
                    offset: entry.local_header_offset,
                    message: format!("local header of '{}' lies past the central directory", entry.path),
                });
            }

            tracing::trace!(path = %entry.path, crc32 = entry.crc32, "Central directory entry");
            entries.push(entry);

            if let Some(cb) = progress {
                if i % 1000 == 0 {
                    cb(ParseProgress {
                        phase: ParsePhase::Indexing,
                        bytes_processed: reader.stream_position()?,
                        total_bytes: Some(eocd.cd_offset + eocd.cd_size),
                        current_item: entries.last().map(|e| e.path.clone()),
                        items_processed: i,
                        total_items: Some(eocd.total_entries),
                    });
                }
            }
        }

        let end = reader.stream_position()?;
        if end > eocd.offset {
            return Err(ParseError::CorruptedData {
                offset: end,
                message: "central directory overruns its end record".into(),
            });
        }

        Ok(entries)
    }

    /// Parse a single central directory entry
    fn parse_cd_entry<R: Read + Seek>(&self, reader: &mut R) -> ParseResult<ZipEntry> {
        let sig = reader.read_u32::<LittleEndian>()?;
        if sig != CD_SIGNATURE {
            return Err(ParseError::InvalidMagic {
                expected: CD_SIGNATURE.to_le_bytes().to_vec(),
                found: sig.to_le_bytes().to_vec(),
            });
        }

        let _version_made       = reader.read_u16::<LittleEndian>()?;
        let version_needed      = reader.read_u16::<LittleEndian>()?;
        let flags               = reader.read_u16::<LittleEndian>()?;
        let compression         = CompressionMethod::from(reader.read_u16::<LittleEndian>()?);
        let mod_time            = reader.read_u16::<LittleEndian>()?;
        let mod_date            = reader.read_u16::<LittleEndian>()?;
        let crc32               = reader.read_u32::<LittleEndian>()?;
        let compressed_size     = reader.read_u32::<LittleEndian>()?;
        let uncompressed_size   = reader.read_u32::<LittleEndian>()?;
        let name_length         = reader.read_u16::<LittleEndian>()? as usize;
        let extra_length        = reader.read_u16::<LittleEndian>()? as usize;
        let comment_length      = reader.read_u16::<LittleEndian>()?;
        let _disk_start         = reader.read_u16::<LittleEndian>()?;
        let _internal_attrs     = reader.read_u16::<LittleEndian>()?;
        let external_attrs      = reader.read_u32::<LittleEndian>()?;
        let local_header_offset = reader.read_u32::<LittleEndian>()?;

        if version_needed & 0xFF > MAX_VERSION_NEEDED {
            return Err(ParseError::UnsupportedVersion {
                version: u32::from(version_needed & 0xFF),
            });
        }

        // Read filename
        let mut name_bytes = vec![0u8; name_length];
        reader.read_exact(&mut name_bytes)?;
        let raw_name = if flags & FLAG_UTF8 != 0 {
            String::from_utf8(name_bytes)
                .map_err(|_| ParseError::InvalidStructure("file name is not valid UTF-8".into()))?
        } else {
            cp437::decode(&name_bytes)
        };

        // Read extra field
        let mut extra = vec![0u8; extra_length];
        reader.read_exact(&mut extra)?;

        let (compressed_size, uncompressed_size, local_header_offset) =
            parse_zip64_extra(&extra, compressed_size, uncompressed_size, local_header_offset)?;

        // Skip comment
        reader.seek(SeekFrom::Current(i64::from(comment_length)))?;

        let is_directory = raw_name.ends_with('/')
            || raw_name.ends_with('\\')
            || external_attrs & DOS_DIRECTORY_ATTR != 0;
        let path = normalize_entry_name(&raw_name, is_directory);

        Ok(ZipEntry {
            path,
            compression,
            crc32,
            compressed_size,
            uncompressed_size,
            local_header_offset,
            flags,
            mod_time,
            mod_date,
            is_encrypted: flags & FLAG_ENCRYPTED != 0,
            is_directory,
        })
    }
}

/// Parse ZIP64 extra field
///
/// Values are only present for the fields whose 32-bit slot is saturated,
/// in the order uncompressed size, compressed size, local header offset.
fn parse_zip64_extra(
    extra: &[u8],
    compressed_size: u32,
    uncompressed_size: u32,
    local_offset: u32,
) -> ParseResult<(u64, u64, u64)> {
    let mut compressed = u64::from(compressed_size);
    let mut uncompressed = u64::from(uncompressed_size);
    let mut offset = u64::from(local_offset);

    let mut cursor = Cursor::new(extra);
    while (cursor.position() as usize) + 4 <= extra.len() {
        let id = cursor.read_u16::<LittleEndian>()?;
        let size = u64::from(cursor.read_u16::<LittleEndian>()?);
        let field_start = cursor.position();

        if id == 0x0001 {
            let mut field = Cursor::new(
                extra
                    .get(field_start as usize..(field_start + size) as usize)
                    .ok_or_else(|| ParseError::CorruptedData {
                        offset: field_start,
                        message: "ZIP64 extra field is truncated".into(),
                    })?,
            );

            if uncompressed_size == 0xFFFF_FFFF {
                uncompressed = field.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFF_FFFF {
                compressed = field.read_u64::<LittleEndian>()?;
            }
            if local_offset == 0xFFFF_FFFF {
                offset = field.read_u64::<LittleEndian>()?;
            }
            break;
        }

        cursor.set_position(field_start + size);
    }

    Ok((compressed, uncompressed, offset))
}

/// Normalize a stored entry name to `/` separated form
///
/// Leading separators are dropped, empty segments collapse, and directory
/// names always end in `/`.
fn normalize_entry_name(raw: &str, is_directory: bool) -> String {
    let joined = raw
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if is_directory && !joined.is_empty() {
        format!("{}/", joined)
    } else {
        joined
    }
}

impl Parser for ZipParser {
    type Output = ZipArchive;

    fn extensions(&self) -> &[&str] {
        &["zip", "jar", "apk", "docx", "xlsx", "odt"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(ZIP_MAGIC)
    }

    fn name(&self) -> &str {
        "ZIP Archive Reader"
    }

    fn parse_with_options<R: Read + Seek>(
        &self,
        mut reader: R,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size < EOCD_MIN_SIZE {
            return Err(ParseError::CorruptedData {
                offset: 0,
                message: format!("{} bytes is too small for a ZIP archive", file_size),
            });
        }

        if let Some(ref cb) = progress {
            cb(ParseProgress {
                phase: ParsePhase::ReadingHeader,
                bytes_processed: 0,
                total_bytes: Some(file_size),
                current_item: None,
                items_processed: 0,
                total_items: None,
            });
        }

        let eocd = self.parse_eocd(&mut reader, file_size)?;
        tracing::debug!(
            entries = eocd.total_entries,
            cd_offset = eocd.cd_offset,
            cd_size = eocd.cd_size,
            comment_length = eocd.comment_length,
            "End of central directory"
        );

        if eocd.disk_number != 0 || eocd.cd_disk != 0 {
            return Err(ParseError::UnsupportedFeature("multi-disk archives".into()));
        }
        if eocd.total_entries > options.max_entries {
            return Err(ParseError::InvalidStructure(format!(
                "{} entries exceeds the limit of {}",
                eocd.total_entries, options.max_entries
            )));
        }

        let entries =
            self.parse_central_directory(&mut reader, &eocd, options, progress.as_ref())?;
        let archive = ZipArchive::from_entries(entries);

        if let Some(ref cb) = progress {
            cb(ParseProgress {
                phase: ParsePhase::Complete,
                bytes_processed: file_size,
                total_bytes: Some(file_size),
                current_item: None,
                items_processed: archive.entry_count() as u64,
                total_items: Some(eocd.total_entries),
            });
        }

        Ok(archive)
    }
}

/// Read an archive from disk into a path-keyed metadata map
///
/// The file is opened and closed within this call, on success and on error.
pub fn read_archive(path: &Path) -> ParseResult<EntryMap> {
    read_archive_with_options(path, &ParseOptions::default())
}

/// Read an archive from disk with custom parse options
pub fn read_archive_with_options(path: &Path, options: &ParseOptions) -> ParseResult<EntryMap> {
    let parser = ZipParser::new();
    crate::log_read_start!(parser.name(), path);

    let start = Instant::now();
    let progress: ProgressCallback = Box::new(|p: ParseProgress| {
        tracing::trace!(phase = ?p.phase, fraction = ?p.fraction(), item = ?p.current_item, "Read progress");
    });
    let archive = crate::logging::instrument_read(parser.name(), path, || {
        parser.parse_file_with_options(path, options, Some(progress))
    });

    match archive {
        Ok(archive) => {
            let stats = archive.statistics();
            tracing::debug!(
                files = stats.file_count,
                directories = stats.directory_count,
                encrypted = stats.encrypted_count,
                uncompressed = stats.total_uncompressed,
                compressed = stats.total_compressed,
                "Archive statistics"
            );
            let map = archive.entry_map();
            crate::log_read_complete!(parser.name(), path, start.elapsed(), map.len());
            Ok(map)
        }
        Err(e) => {
            crate::log_read_error!(parser.name(), path, e);
            Err(e)
        }
    }
}

/// End of Central Directory record
#[derive(Debug)]
struct EndOfCentralDirectory {
    /// Offset of the record that terminates the central directory
    offset: u64,
    /// Bytes of leading data before the archive proper
    prefix: u64,
    disk_number: u32,
    cd_disk: u32,
    total_entries: u64,
    cd_size: u64,
    cd_offset: u64,
    comment_length: u16,
}
