//! Error types for point cache loading.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for point cache operations.
///
/// Every variant here aborts a load. Query misses on a loaded cache are
/// reported through `Option` instead and never surface as an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Extension does not map to a supported point cache format
    #[error("Unsupported point cache file: {0}")]
    UnsupportedFile(PathBuf),

    /// Stream ended before a complete value was read
    #[error("Unexpected end of data at offset {0}")]
    UnexpectedEof(usize),

    /// A structural marker other than the expected one was found
    #[error("Expected marker '{}', found '{}' at offset {offset}", marker_char(.expected), marker_char(.found))]
    UnexpectedMarker { expected: u8, found: u8, offset: usize },

    /// Marker byte is not part of the format's alphabet
    #[error("Unknown marker '{}' (0x{marker:02x}) at offset {offset}", marker_char(.marker))]
    UnknownMarker { marker: u8, offset: usize },

    /// Source value is wider than the value being read into
    #[error("Cannot read a {source_width}-byte value into a {target_width}-byte target")]
    ValueTooNarrow { source_width: usize, target_width: usize },

    /// Object key other than the expected one was found
    #[error("Expected key '{expected}', found '{found}'")]
    UnexpectedKey { expected: String, found: String },

    /// Header declares counts that the body or header arrays contradict
    #[error("Header inconsistent: {field} declares {declared}, found {actual}")]
    HeaderMismatch { field: &'static str, declared: usize, actual: usize },

    /// Invalid data structure in file
    #[error("Invalid point cache structure: {0}")]
    InvalidStructure(String),

    /// CSV title row could not be used
    #[error("Invalid title row: {0}")]
    InvalidTitleRow(String),

    /// Cache holds no retained source bytes
    #[error("Point cache has no raw source data to export")]
    MissingRawData,

    /// Text JSON parse failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a header mismatch error.
    pub fn header(field: &'static str, declared: usize, actual: usize) -> Self {
        Self::HeaderMismatch { field, declared, actual }
    }
}

fn marker_char(marker: &u8) -> char {
    char::from(*marker)
}

/// Result type alias for point cache operations.
pub type Result<T> = std::result::Result<T, Error>;
