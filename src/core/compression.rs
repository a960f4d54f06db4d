//! Retention of the original source bytes.
//!
//! Loaded files may keep their raw bytes zlib-compressed alongside the
//! parsed store so they can be written back out unchanged.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::util::{Error, Result};

/// Compress data using zlib.
///
/// Returns compressed data behind an 8-byte header holding the uncompressed
/// size. Level 0 stores the bytes unchanged (still behind the header).
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(8 + data.len() / 2);
    result.extend_from_slice(&(data.len() as u64).to_le_bytes());

    let compression = match level {
        i32::MIN..=0 => Compression::none(),
        1..=9 => Compression::new(level as u32),
        _ => Compression::best(),
    };

    let mut encoder = ZlibEncoder::new(result, compression);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress data produced by [`compress`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 8 {
        return Err(Error::invalid("compressed block is missing its size header"));
    }

    let mut size = [0u8; 8];
    size.copy_from_slice(&data[..8]);
    let uncompressed_size = u64::from_le_bytes(size) as usize;

    let mut decoder = ZlibDecoder::new(&data[8..]);
    let mut decompressed = Vec::with_capacity(uncompressed_size);
    decoder.read_to_end(&mut decompressed)?;

    if decompressed.len() != uncompressed_size {
        return Err(Error::header(
            "raw data size",
            uncompressed_size,
            decompressed.len(),
        ));
    }
    Ok(decompressed)
}

/// Compressed copy of a source file plus the id of its format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawData {
    format_id: String,
    uncompressed_size: usize,
    compressed: Vec<u8>,
}

impl RawData {
    pub fn compress(format_id: &str, source: &[u8], level: i32) -> Result<Self> {
        Ok(Self {
            format_id: format_id.to_string(),
            uncompressed_size: source.len(),
            compressed: compress(source, level)?,
        })
    }

    /// Id of the format the bytes were loaded as (`HCSV`, `HJSON`, `HBJSON`).
    pub fn format_id(&self) -> &str {
        &self.format_id
    }

    pub fn uncompressed_size(&self) -> usize {
        self.uncompressed_size
    }

    pub fn compressed_size(&self) -> usize {
        self.compressed.len()
    }

    /// Inflate back to the original source bytes.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        decompress(&self.compressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress() {
        let original = b"id,P.x,P.y,P.z,time\n0,1,2,3,0\n".repeat(100);

        let compressed = compress(&original, 6).unwrap();
        assert!(compressed.len() < original.len());

        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_level_zero_round_trip() {
        let original = b"Short data";
        let stored = compress(original, 0).unwrap();
        assert_eq!(decompress(&stored).unwrap(), original);
    }

    #[test]
    fn test_empty_input() {
        let stored = compress(b"", 6).unwrap();
        assert_eq!(decompress(&stored).unwrap(), b"");
    }

    #[test]
    fn test_decompress_garbage() {
        assert!(decompress(b"abc").is_err());
        let mut bad = 10u64.to_le_bytes().to_vec();
        bad.extend_from_slice(b"not zlib");
        assert!(decompress(&bad).is_err());
    }

    #[test]
    fn test_raw_data() {
        let raw = RawData::compress("HCSV", b"P,time\n1,0\n", 9).unwrap();
        assert_eq!(raw.format_id(), "HCSV");
        assert_eq!(raw.uncompressed_size(), 11);
        assert_eq!(raw.decompress().unwrap(), b"P,time\n1,0\n");
    }
}
