// zipdelta-parsers/src/traits.rs
//! Reader interface shared by archive formats.
//!
//! A reader only lists an archive's table of contents; entry data is never
//! decompressed.

use std::io::{Read, Seek};
use std::path::Path;

use thiserror::Error;

/// Failure while reading an archive listing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic bytes: expected {expected:02X?}, found {found:02X?}")]
    InvalidMagic { expected: Vec<u8>, found: Vec<u8> },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData { offset: u64, message: String },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("{context}: {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Prefix the error with where in the archive it happened
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ParseError::Nested {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any `Nested` layers
    pub fn root_cause(&self) -> &ParseError {
        match self {
            ParseError::Nested { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True when the input ended mid-structure
    pub fn is_truncation(&self) -> bool {
        matches!(
            self.root_cause(),
            ParseError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof
        )
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Receives progress while a large central directory is walked
pub type ProgressCallback = Box<dyn Fn(ParseProgress) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ParseProgress {
    pub phase: ParsePhase,
    /// Bytes of the archive consumed so far
    pub bytes_processed: u64,
    /// Archive size, when the source is seekable to its end
    pub total_bytes: Option<u64>,
    /// Path of the entry just listed
    pub current_item: Option<String>,
    /// Entries listed so far
    pub items_processed: u64,
    /// Entry count announced by the archive trailer
    pub total_items: Option<u64>,
}

impl ParseProgress {
    /// Share of announced entries listed, in `0.0..=1.0`
    pub fn fraction(&self) -> Option<f32> {
        self.total_items.map(|total| match total {
            0 => 1.0,
            total => (self.items_processed.min(total) as f32) / total as f32,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePhase {
    /// Locating the archive trailer
    ReadingHeader,
    /// Walking central directory records
    Indexing,
    Complete,
}

/// Limits applied while reading one archive
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Reject entries whose data would lie past the central directory
    pub strict_validation: bool,
    /// Upper bound on the number of entries accepted from one archive
    pub max_entries: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_validation: false,
            max_entries: 1_000_000,
        }
    }
}

/// Lists the table of contents of one archive format
pub trait Parser: Send + Sync {
    type Output: Send + Sync;

    /// Lowercase file extensions this reader claims, without the dot
    fn extensions(&self) -> &[&str];

    /// Signature found at offset 0 of archives in this format
    fn magic_bytes(&self) -> Option<&[u8]> {
        None
    }

    fn name(&self) -> &str;

    fn parse<R: Read + Seek>(&self, reader: R) -> ParseResult<Self::Output> {
        self.parse_with_options(reader, &ParseOptions::default(), None)
    }

    fn parse_with_options<R: Read + Seek>(
        &self,
        reader: R,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output>;

    fn parse_file(&self, path: &Path) -> ParseResult<Self::Output> {
        self.parse_file_with_options(path, &ParseOptions::default(), None)
    }

    /// Read `path`; the file handle is dropped before this returns
    fn parse_file_with_options(
        &self,
        path: &Path,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        let file = std::fs::File::open(path)?;
        self.parse_with_options(std::io::BufReader::new(file), options, progress)
    }

    /// Whether `path` looks like this format, by extension or signature
    fn can_parse(&self, path: &Path) -> bool {
        let by_extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()));
        if by_extension {
            return true;
        }

        let Some(magic) = self.magic_bytes() else {
            return false;
        };
        let mut head = vec![0u8; magic.len()];
        std::fs::File::open(path)
            .and_then(|mut file| file.read_exact(&mut head))
            .is_ok_and(|()| head == magic)
    }
}
