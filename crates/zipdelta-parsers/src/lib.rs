//! zipdelta-parsers
//!
//! Readers that turn an archive on disk into a flat listing of entry
//! metadata: path, size, checksum and modification time.
//!
//! # Supported Formats
//!
//! | Format | Extension | Description |
//! |--------|-----------|-------------|
//! | ZIP    | `.zip`    | PKZIP archives, including ZIP64 |
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use zipdelta_parsers::{read_archive, Parser, ZipParser};
//!
//! let entries = read_archive(Path::new("release.zip"))?;
//! for (path, entry) in &entries {
//!     println!("{path}: {}", entry.display_size());
//! }
//!
//! let archive = ZipParser::new().parse_file(Path::new("release.zip"))?;
//! println!("Found {} entries", archive.entry_count());
//! # Ok::<(), zipdelta_parsers::ParseError>(())
//! ```

pub mod logging;
pub mod traits;
pub mod zip;

// Re-export main types
pub use traits::{
    ParseError, ParseOptions, ParsePhase, ParseProgress, ParseResult, Parser, ProgressCallback,
};

pub use zip::{
    entry_map, read_archive, read_archive_with_options, ArchiveEntry, ArchiveStatistics,
    CompressionMethod, EntryMap, ZipArchive, ZipEntry, ZipParser, DATE_FORMAT,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
