//! Point cache file loading.
//!
//! Each supported file type has a pure parse function producing a
//! [`ParsedCache`](crate::core::ParsedCache). This module picks the parser
//! from the file extension (and, for `.hjson`, from the content), reads the
//! file, and optionally keeps a compressed copy of the source bytes.
//!
//! # Example
//!
//! ```ignore
//! use houdini_pointcache::prelude::*;
//!
//! let cache = PointCache::load("smoke.hbjson")?;
//! let position = cache.point_position_at_time(0, 1.5);
//! ```

mod compact;
mod csv;
mod export;
mod frames;
mod hbjson;
mod json;
mod tagged;
mod tagged_json;
mod token;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{PointCache, RawData};
use crate::util::{Error, Result};

pub use compact::CompactReader;
pub use export::{export_raw, export_raw_to_path, supports_export};
pub use frames::{Frame, FrameAssembler, Header};
pub use tagged::TaggedReader;

// ============================================================================
// File types
// ============================================================================

/// Supported point cache file types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FileType {
    /// `.hcsv`
    Csv,
    /// `.hjson`, text or legacy tagged binary
    Json,
    /// `.hbjson`
    BinaryJson,
    Invalid,
}

impl FileType {
    /// File type from a path's extension, compared case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("hcsv") => Self::Csv,
            Some("hjson") => Self::Json,
            Some("hbjson") => Self::BinaryJson,
            _ => Self::Invalid,
        }
    }

    /// Format id recorded with retained raw data.
    pub fn format_id(self) -> &'static str {
        match self {
            Self::Csv => "HCSV",
            Self::Json => "HJSON",
            Self::BinaryJson => "HBJSON",
            Self::Invalid => "",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "hcsv",
            Self::Json => "hjson",
            Self::BinaryJson => "hbjson",
            Self::Invalid => "",
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Load configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Replaces the CSV title row unless blank once spaces are removed.
    pub custom_title_row: Option<String>,
    /// Keep a compressed copy of the source for export.
    pub retain_raw_data: bool,
    /// zlib level used for the retained copy.
    pub compression_level: i32,
    /// Memory-map source files (needs the `mmap` feature).
    pub use_mmap: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            custom_title_row: None,
            retain_raw_data: true,
            compression_level: 6,
            use_mmap: true,
        }
    }
}

impl LoadOptions {
    /// Read options from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| map_open_error(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_title_row(mut self, title: impl Into<String>) -> Self {
        self.custom_title_row = Some(title.into());
        self
    }
}

// ============================================================================
// Loading
// ============================================================================

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text sources may start with a UTF-8 byte order mark.
#[inline]
fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// True if `.hjson` content is the legacy tagged binary layout.
///
/// Text JSON opens with `{` followed by whitespace or the `"` of the first
/// key; the tagged layout follows `{` with the key's length marker.
pub fn is_tagged_binary(bytes: &[u8]) -> bool {
    match bytes {
        [b'{', next, ..] => !next.is_ascii_whitespace() && *next != b'"',
        _ => false,
    }
}

/// Parse an in-memory file of the given type.
pub fn load_from_bytes(bytes: &[u8], file_type: FileType, opts: &LoadOptions) -> Result<PointCache> {
    let parsed = match file_type {
        FileType::Csv => {
            let text = String::from_utf8(strip_bom(bytes).to_vec())?;
            csv::parse(&text, opts.custom_title_row.as_deref())?
        }
        FileType::Json => {
            let body = strip_bom(bytes);
            if is_tagged_binary(body) {
                debug!("Reading .hjson as tagged binary");
                tagged_json::parse(body)?
            } else {
                json::parse(body)?
            }
        }
        FileType::BinaryJson => hbjson::parse(bytes)?,
        FileType::Invalid => {
            return Err(Error::other("cannot parse a file of unknown type"));
        }
    };

    let raw = if opts.retain_raw_data {
        Some(RawData::compress(file_type.format_id(), bytes, opts.compression_level)?)
    } else {
        None
    };

    Ok(PointCache::from_parsed(parsed, file_type, raw))
}

fn map_open_error(path: &Path, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::FileNotFound(path.to_path_buf())
    } else {
        Error::Io(e)
    }
}

#[cfg(feature = "mmap")]
fn load_mapped(path: &Path, file_type: FileType, opts: &LoadOptions) -> Result<PointCache> {
    let file = fs::File::open(path).map_err(|e| map_open_error(path, e))?;
    if file.metadata()?.len() == 0 {
        return load_from_bytes(&[], file_type, opts);
    }
    // Safety: opened read-only and dropped before returning
    let mmap = unsafe { memmap2::Mmap::map(&file) }?;
    load_from_bytes(&mmap, file_type, opts)
}

/// Load a point cache file.
pub fn load(path: impl AsRef<Path>, opts: &LoadOptions) -> Result<PointCache> {
    let path = path.as_ref();
    let file_type = FileType::from_path(path);
    if file_type == FileType::Invalid {
        return Err(Error::UnsupportedFile(path.to_path_buf()));
    }

    debug!(path = %path.display(), format = file_type.format_id(), "Loading point cache");

    #[cfg(feature = "mmap")]
    {
        if opts.use_mmap {
            return load_mapped(path, file_type, opts);
        }
    }

    let bytes = fs::read(path).map_err(|e| map_open_error(path, e))?;
    load_from_bytes(&bytes, file_type, opts)
}

impl PointCache {
    /// Load a file with default options.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load(path, &LoadOptions::default())
    }

    pub fn load_with(path: impl AsRef<Path>, opts: &LoadOptions) -> Result<Self> {
        load(path, opts)
    }

    pub fn load_from_bytes(bytes: &[u8], file_type: FileType, opts: &LoadOptions) -> Result<Self> {
        load_from_bytes(bytes, file_type, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type() {
        assert_eq!(FileType::from_path("a/b.hcsv"), FileType::Csv);
        assert_eq!(FileType::from_path("B.HJSON"), FileType::Json);
        assert_eq!(FileType::from_path("c.HbJson"), FileType::BinaryJson);
        assert_eq!(FileType::from_path("d.csv"), FileType::Invalid);
        assert_eq!(FileType::from_path("noext"), FileType::Invalid);
        assert_eq!(FileType::BinaryJson.format_id(), "HBJSON");
    }

    #[test]
    fn test_tagged_sniff() {
        assert!(!is_tagged_binary(b"{\"header\":{}}"));
        assert!(!is_tagged_binary(b"{\n  \"header\""));
        assert!(is_tagged_binary(b"{U\x06header"));
        assert!(!is_tagged_binary(b"{"));
        assert!(!is_tagged_binary(strip_bom(b"\xEF\xBB\xBF{\"header\"")));
    }

    #[test]
    fn test_json_with_bom() {
        let text = "\u{feff}{\"header\": {\"num_samples\": 1, \"num_frames\": 1, \
                    \"num_points\": 1, \"num_attrib\": 1, \"attrib_name\": [\"P\"], \
                    \"attrib_size\": [3]}, \"cache_data\": {\"frames\": [{\"number\": 1, \
                    \"time\": 0.5, \"num_points\": 1, \"frame_data\": [[1, 2, 3]]}]}}";
        let cache = load_from_bytes(text.as_bytes(), FileType::Json, &LoadOptions::default()).unwrap();
        assert_eq!(cache.number_of_points(), 1);
        assert_eq!(cache.time_value(0), Some(0.5));
        // The retained copy keeps the mark
        assert_eq!(cache.raw_data().unwrap().decompress().unwrap(), text.as_bytes());
    }

    #[test]
    fn test_options_defaults() {
        let opts: LoadOptions = serde_json::from_str(r#"{"compression_level": 9}"#).unwrap();
        assert_eq!(opts.compression_level, 9);
        assert!(opts.retain_raw_data);
        assert!(opts.custom_title_row.is_none());
    }

    #[test]
    fn test_load_from_bytes() {
        let cache = load_from_bytes(b"id,time\n4,0\n4,1\n", FileType::Csv, &LoadOptions::default()).unwrap();
        assert_eq!(cache.number_of_points(), 1);
        assert_eq!(cache.format(), FileType::Csv);
        assert_eq!(cache.raw_data().map(RawData::format_id), Some("HCSV"));

        let opts = LoadOptions {
            retain_raw_data: false,
            ..LoadOptions::default()
        };
        let cache = load_from_bytes("\u{feff}P,time\n1,0\n".as_bytes(), FileType::Csv, &opts).unwrap();
        assert!(cache.raw_data().is_none());
        assert_eq!(cache.attribute_names()[0], "P");
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            PointCache::load("points.abc"),
            Err(Error::UnsupportedFile(_))
        ));
        assert!(matches!(
            PointCache::load("/definitely/missing.hcsv"),
            Err(Error::FileNotFound(_))
        ));
    }
}
