// zipdelta-parsers/src/zip/entry.rs
//! ZIP archive entry structures

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::CompressionMethod;

/// Display format for modification timestamps
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Entry path to metadata, sorted by path
pub type EntryMap = BTreeMap<String, ArchiveEntry>;

/// Represents a single central directory record of a ZIP archive
#[derive(Debug, Clone)]
pub struct ZipEntry {
    /// Full path within the archive (`/` separated, directories end in `/`)
    pub path: String,
    /// Compression method used
    pub compression: CompressionMethod,
    /// CRC32 checksum of uncompressed data
    pub crc32: u32,
    /// Size of compressed data
    pub compressed_size: u64,
    /// Size of uncompressed data
    pub uncompressed_size: u64,
    /// Offset to local file header
    pub local_header_offset: u64,
    /// General purpose bit flags
    pub flags: u16,
    /// DOS modification time
    pub mod_time: u16,
    /// DOS modification date
    pub mod_date: u16,
    /// Whether entry is encrypted
    pub is_encrypted: bool,
    /// Whether entry is a directory
    pub is_directory: bool,
}

impl ZipEntry {
    /// Decode the DOS date/time pair
    ///
    /// Returns `None` for dates a DOS clock cannot represent (month or day 0).
    pub fn modification_datetime(&self) -> Option<NaiveDateTime> {
        let year = 1980 + i32::from((self.mod_date >> 9) & 0x7F);
        let month = u32::from((self.mod_date >> 5) & 0x0F);
        let day = u32::from(self.mod_date & 0x1F);
        let hour = u32::from((self.mod_time >> 11) & 0x1F);
        let minute = u32::from((self.mod_time >> 5) & 0x3F);
        let second = u32::from(self.mod_time & 0x1F) * 2;

        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    }

    /// Convert into the comparison record
    pub fn to_archive_entry(&self) -> ArchiveEntry {
        ArchiveEntry {
            path: self.path.clone(),
            is_directory: self.is_directory,
            size: Some(self.uncompressed_size),
            checksum: Some(self.crc32),
            modified_at: self.modification_datetime(),
        }
    }
}

/// Metadata of one archive member as seen by the comparison engine
///
/// Only entries that exist in the archive are represented; a missing
/// path is distinct from an entry of size zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Full path within the archive
    pub path: String,
    /// Whether entry is a directory marker
    pub is_directory: bool,
    /// Size of uncompressed data
    pub size: Option<u64>,
    /// CRC32 of uncompressed data
    pub checksum: Option<u32>,
    /// Last modification time
    pub modified_at: Option<NaiveDateTime>,
}

impl ArchiveEntry {
    /// Create a file entry
    pub fn file(
        path: impl Into<String>,
        size: u64,
        checksum: u32,
        modified_at: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
            size: Some(size),
            checksum: Some(checksum),
            modified_at,
        }
    }

    /// Create an explicit directory entry
    pub fn directory(path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        Self {
            path,
            is_directory: true,
            size: None,
            checksum: None,
            modified_at: None,
        }
    }

    /// Size column as shown next to the entry
    pub fn display_size(&self) -> String {
        self.size.map(|s| format!("{} bytes", s)).unwrap_or_default()
    }

    /// Date column as shown next to the entry
    pub fn display_date(&self) -> String {
        self.modified_at
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }
}

/// Collect entries into a path-keyed map
pub fn entry_map<I>(entries: I) -> EntryMap
where
    I: IntoIterator<Item = ArchiveEntry>,
{
    entries.into_iter().map(|e| (e.path.clone(), e)).collect()
}
