// zipdelta-parsers/src/zip/archive.rs
//! ZIP archive listing structure

use std::collections::HashMap;

use super::entry::{EntryMap, ZipEntry};

/// Parsed central directory of a ZIP archive
#[derive(Debug, Default)]
pub struct ZipArchive {
    /// All entries in central directory order
    pub entries: Vec<ZipEntry>,
    /// Path to entry index mapping for fast lookup
    pub path_index: HashMap<String, usize>,
}

impl ZipArchive {
    /// Create a new empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an archive from parsed entries
    ///
    /// Entries with an empty path are dropped. When a path occurs more than
    /// once the last record wins, matching what extraction tools do.
    pub fn from_entries(entries: Vec<ZipEntry>) -> Self {
        let mut kept = Vec::with_capacity(entries.len());
        let mut path_index = HashMap::with_capacity(entries.len());

        for entry in entries {
            if entry.path.trim_matches('/').is_empty() {
                tracing::warn!(offset = entry.local_header_offset, "Skipping entry with empty name");
                continue;
            }

            if let Some(previous) = path_index.insert(entry.path.clone(), kept.len()) {
                tracing::warn!(
                    path = %entry.path,
                    previous_index = previous,
                    "Duplicate entry name, keeping the last record"
                );
            }
            kept.push(entry);
        }

        Self {
            entries: kept,
            path_index,
        }
    }

    /// Get total number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Get number of files (non-directories)
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_directory).count()
    }

    /// Get number of directories
    pub fn directory_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_directory).count()
    }

    /// Get an entry by path
    pub fn get(&self, path: &str) -> Option<&ZipEntry> {
        self.path_index.get(path).map(|idx| &self.entries[*idx])
    }

    /// Check if path exists in archive
    pub fn contains(&self, path: &str) -> bool {
        self.path_index.contains_key(path)
    }

    /// Metadata of every distinct path, keyed and sorted by path
    pub fn entry_map(&self) -> EntryMap {
        self.path_index
            .iter()
            .map(|(path, idx)| (path.clone(), self.entries[*idx].to_archive_entry()))
            .collect()
    }

    /// Get archive statistics
    pub fn statistics(&self) -> ArchiveStatistics {
        let mut stats = ArchiveStatistics {
            total_entries: self.entries.len(),
            ..Default::default()
        };

        for entry in &self.entries {
            if entry.is_directory {
                stats.directory_count += 1;
            } else {
                stats.file_count += 1;
                stats.total_uncompressed += entry.uncompressed_size;
                stats.total_compressed += entry.compressed_size;
                if entry.is_encrypted {
                    stats.encrypted_count += 1;
                }
            }
        }

        stats
    }
}

/// Archive statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveStatistics {
    /// Total number of entries
    pub total_entries: usize,
    /// Number of files
    pub file_count: usize,
    /// Number of directories
    pub directory_count: usize,
    /// Number of encrypted files
    pub encrypted_count: usize,
    /// Total uncompressed size in bytes
    pub total_uncompressed: u64,
    /// Total compressed size in bytes
    pub total_compressed: u64,
}
