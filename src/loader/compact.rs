//! Compact little-endian token reader used by `.hbjson` files.
//!
//! Values carry no type marker of their own: the caller supplies the marker,
//! usually from the header's declared per-component data types. Only string
//! lengths are self-describing (a marker byte followed by the length value).

use byteorder::LittleEndian;

use super::token::{check_width, ByteCursor, Numeric, Scalar};
use crate::util::{Error, Result};

/// Marker alphabet of the compact format.
pub mod marker {
    pub const CHAR: u8 = b'c';
    pub const INT8: u8 = b'b';
    pub const UINT8: u8 = b'B';
    pub const BOOL: u8 = b'?';
    pub const INT16: u8 = b'h';
    pub const UINT16: u8 = b'H';
    pub const INT32: u8 = b'l';
    pub const UINT32: u8 = b'L';
    pub const INT64: u8 = b'q';
    pub const UINT64: u8 = b'Q';
    pub const FLOAT32: u8 = b'f';
    pub const FLOAT64: u8 = b'd';
    pub const STRING: u8 = b's';
    pub const OBJECT_START: u8 = b'{';
    pub const OBJECT_END: u8 = b'}';
    pub const ARRAY_START: u8 = b'[';
    pub const ARRAY_END: u8 = b']';
    /// Read the target type's native representation.
    pub const NATIVE: u8 = 0;
}

/// Byte width of a scalar marker, `None` for anything that is not a scalar.
pub fn marker_width(m: u8) -> Option<usize> {
    match m {
        marker::CHAR | marker::INT8 | marker::UINT8 | marker::BOOL => Some(1),
        marker::INT16 | marker::UINT16 => Some(2),
        marker::INT32 | marker::UINT32 | marker::FLOAT32 => Some(4),
        marker::INT64 | marker::UINT64 | marker::FLOAT64 => Some(8),
        _ => None,
    }
}

/// Token reader over a compact binary buffer.
pub struct CompactReader<'a> {
    cursor: ByteCursor<'a, LittleEndian>,
}

impl<'a> CompactReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.cursor.at_end()
    }

    /// Read one structural marker byte.
    pub fn read_marker(&mut self) -> Result<u8> {
        self.cursor.read_u8()
    }

    /// Consume a marker and fail unless it is `expected`.
    pub fn expect_marker(&mut self, expected: u8) -> Result<()> {
        let offset = self.cursor.position();
        let found = self.read_marker()?;
        if found != expected {
            return Err(Error::UnexpectedMarker { expected, found, offset });
        }
        Ok(())
    }

    /// True if the next byte is `m`; nothing is consumed.
    #[inline]
    pub fn is_next(&self, m: u8) -> bool {
        self.cursor.peek() == Some(m)
    }

    /// Read a scalar of the given marker type into `T`.
    ///
    /// A marker wider than `T` fails with [`Error::ValueTooNarrow`].
    pub fn read_value<T: Numeric>(&mut self, m: u8) -> Result<T> {
        if m == marker::NATIVE {
            return T::read_native(&mut self.cursor);
        }
        let offset = self.cursor.position();
        let width = marker_width(m).ok_or(Error::UnknownMarker { marker: m, offset })?;
        check_width::<T>(width)?;

        let scalar = match m {
            marker::CHAR | marker::UINT8 => Scalar::UInt(self.cursor.read_u8()? as u64),
            marker::BOOL => Scalar::Bool(self.cursor.read_u8()? != 0),
            marker::INT8 => Scalar::Int(self.cursor.read_i8()? as i64),
            marker::INT16 => Scalar::Int(self.cursor.read_i16()? as i64),
            marker::UINT16 => Scalar::UInt(self.cursor.read_u16()? as u64),
            marker::INT32 => Scalar::Int(self.cursor.read_i32()? as i64),
            marker::UINT32 => Scalar::UInt(self.cursor.read_u32()? as u64),
            marker::INT64 => Scalar::Int(self.cursor.read_i64()?),
            marker::UINT64 => Scalar::UInt(self.cursor.read_u64()?),
            marker::FLOAT32 => Scalar::Float(self.cursor.read_f32()? as f64),
            marker::FLOAT64 => Scalar::Float(self.cursor.read_f64()?),
            _ => return Err(Error::UnknownMarker { marker: m, offset }),
        };
        Ok(T::from_scalar(scalar))
    }

    /// Read a scalar whose marker precedes it in the stream.
    pub fn read_tagged_value<T: Numeric>(&mut self) -> Result<T> {
        let m = self.read_marker()?;
        self.read_value(m)
    }

    /// Read a string (`s`: tagged length + UTF-8 bytes) or a single `c` char.
    pub fn read_string(&mut self, m: u8) -> Result<String> {
        match m {
            marker::STRING => {
                let len: u32 = self.read_tagged_value()?;
                self.cursor.read_utf8(len as usize)
            }
            marker::CHAR => {
                let c = self.cursor.read_u8()?;
                Ok(char::from(c).to_string())
            }
            other => Err(Error::UnexpectedMarker {
                expected: marker::STRING,
                found: other,
                offset: self.cursor.position(),
            }),
        }
    }

    /// Object keys are strings written without their `s` marker.
    pub fn read_key(&mut self) -> Result<String> {
        self.read_string(marker::STRING)
    }

    /// Read a key and fail unless it equals `expected`.
    pub fn expect_key(&mut self, expected: &str) -> Result<()> {
        let found = self.read_key()?;
        if found != expected {
            return Err(Error::UnexpectedKey {
                expected: expected.to_string(),
                found,
            });
        }
        Ok(())
    }

    /// Read `[ v v v ... ]` with every element of marker type `m`.
    pub fn read_array<T: Numeric>(&mut self, m: u8) -> Result<Vec<T>> {
        self.expect_marker(marker::ARRAY_START)?;
        let mut out = Vec::new();
        while !self.at_end() && !self.is_next(marker::ARRAY_END) {
            out.push(self.read_value(m)?);
        }
        self.expect_marker(marker::ARRAY_END)?;
        Ok(out)
    }

    /// Read `[ ... ]` where element `i` uses `markers[i]`.
    ///
    /// With declared markers exactly `markers.len()` values are read, since a
    /// raw payload byte may look like `]`. Without them the array is native
    /// values up to the first `]`.
    pub fn read_array_typed<T: Numeric>(&mut self, markers: &[u8]) -> Result<Vec<T>> {
        self.expect_marker(marker::ARRAY_START)?;
        let mut out = Vec::with_capacity(markers.len());
        if markers.is_empty() {
            while !self.at_end() && !self.is_next(marker::ARRAY_END) {
                out.push(self.read_value(marker::NATIVE)?);
            }
        } else {
            for &m in markers {
                out.push(self.read_value(m)?);
            }
        }
        self.expect_marker(marker::ARRAY_END)?;
        Ok(out)
    }

    /// Read `[ s s s ... ]` of strings of marker type `m`.
    pub fn read_string_array(&mut self, m: u8) -> Result<Vec<String>> {
        self.expect_marker(marker::ARRAY_START)?;
        let mut out = Vec::new();
        while !self.at_end() && !self.is_next(marker::ARRAY_END) {
            out.push(self.read_string(m)?);
        }
        self.expect_marker(marker::ARRAY_END)?;
        Ok(out)
    }
}
