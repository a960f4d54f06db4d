//! Writing retained source bytes back out.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::FileType;
use crate::core::PointCache;
use crate::util::{Error, Result};

/// Formats whose retained bytes can be written back out.
const EXPORTABLE: [FileType; 3] = [FileType::Csv, FileType::Json, FileType::BinaryJson];

/// True if retained data with `format_id` can be exported.
pub fn supports_export(format_id: &str) -> bool {
    EXPORTABLE.iter().any(|t| t.format_id() == format_id)
}

/// Write the original source file, byte for byte, to `writer`.
pub fn export_raw<W: Write>(cache: &PointCache, mut writer: W) -> Result<usize> {
    let raw = cache.raw_data().ok_or(Error::MissingRawData)?;
    if !supports_export(raw.format_id()) {
        return Err(Error::other(format!(
            "no exporter for format '{}'",
            raw.format_id()
        )));
    }

    let bytes = raw.decompress()?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(bytes.len())
}

/// Write the original source file to `path`.
///
/// Returns the number of bytes written.
pub fn export_raw_to_path(cache: &PointCache, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    // Check before creating the file so a failed export leaves nothing behind
    if cache.raw_data().is_none() {
        return Err(Error::MissingRawData);
    }

    let written = export_raw(cache, BufWriter::new(File::create(path)?))?;
    debug!(path = %path.display(), bytes = written, "Exported raw point cache");
    Ok(written)
}
