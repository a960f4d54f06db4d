//! Tagged big-endian token reader used by legacy binary `.hjson` files.
//!
//! Every value is preceded by its own type marker. Object keys are the one
//! exception: they are strings written without the `S` marker.

use byteorder::BigEndian;

use super::token::{check_width, ByteCursor, Numeric, Scalar};
use crate::util::{Error, Result};

/// Marker alphabet of the tagged format.
pub mod marker {
    pub const NULL: u8 = b'Z';
    pub const NOOP: u8 = b'N';
    pub const TRUE: u8 = b'T';
    pub const FALSE: u8 = b'F';
    pub const INT8: u8 = b'i';
    pub const UINT8: u8 = b'U';
    pub const INT16: u8 = b'I';
    pub const INT32: u8 = b'l';
    pub const INT64: u8 = b'L';
    pub const FLOAT32: u8 = b'd';
    pub const FLOAT64: u8 = b'D';
    pub const HIGH_PRECISION: u8 = b'H';
    pub const CHAR: u8 = b'C';
    pub const STRING: u8 = b'S';
    pub const OBJECT_START: u8 = b'{';
    pub const OBJECT_END: u8 = b'}';
    pub const ARRAY_START: u8 = b'[';
    pub const ARRAY_END: u8 = b']';
    pub const CONTAINER_TYPE: u8 = b'$';
    pub const CONTAINER_COUNT: u8 = b'#';
}

/// Byte width of a scalar marker, `None` for non-scalars.
pub fn marker_width(m: u8) -> Option<usize> {
    match m {
        marker::NULL | marker::NOOP | marker::TRUE | marker::FALSE => Some(0),
        marker::INT8 | marker::UINT8 | marker::CHAR => Some(1),
        marker::INT16 => Some(2),
        marker::INT32 | marker::FLOAT32 => Some(4),
        marker::INT64 | marker::FLOAT64 | marker::HIGH_PRECISION => Some(8),
        _ => None,
    }
}

/// Token reader over a tagged binary buffer.
pub struct TaggedReader<'a> {
    cursor: ByteCursor<'a, BigEndian>,
}

impl<'a> TaggedReader<'a> {
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

    pub fn read_marker(&mut self) -> Result<u8> {
        self.cursor.read_u8()
    }

    pub fn expect_marker(&mut self, expected: u8) -> Result<()> {
        let offset = self.cursor.position();
        let found = self.read_marker()?;
        if found != expected {
            return Err(Error::UnexpectedMarker { expected, found, offset });
        }
        Ok(())
    }

    #[inline]
    pub fn is_next(&self, m: u8) -> bool {
        self.cursor.peek() == Some(m)
    }

    /// Decode the payload of a scalar whose marker was already consumed.
    fn read_payload<T: Numeric>(&mut self, m: u8, offset: usize) -> Result<T> {
        let width = marker_width(m).ok_or(Error::UnknownMarker { marker: m, offset })?;
        check_width::<T>(width)?;

        let scalar = match m {
            marker::NULL | marker::NOOP => Scalar::Null,
            marker::TRUE => Scalar::Bool(true),
            marker::FALSE => Scalar::Bool(false),
            marker::INT8 => Scalar::Int(self.cursor.read_i8()? as i64),
            marker::UINT8 | marker::CHAR => Scalar::UInt(self.cursor.read_u8()? as u64),
            marker::INT16 => Scalar::Int(self.cursor.read_i16()? as i64),
            marker::INT32 => Scalar::Int(self.cursor.read_i32()? as i64),
            marker::INT64 => Scalar::Int(self.cursor.read_i64()?),
            marker::FLOAT32 => Scalar::Float(self.cursor.read_f32()? as f64),
            marker::FLOAT64 | marker::HIGH_PRECISION => Scalar::Float(self.cursor.read_f64()?),
            _ => return Err(Error::UnknownMarker { marker: m, offset }),
        };
        Ok(T::from_scalar(scalar))
    }

    /// Read a marker and the scalar it describes.
    pub fn read_value<T: Numeric>(&mut self) -> Result<T> {
        let offset = self.cursor.position();
        let m = self.read_marker()?;
        self.read_payload(m, offset)
    }

    /// Read the body of a string or char whose marker is `m`.
    fn read_string_body(&mut self, m: u8, offset: usize) -> Result<String> {
        match m {
            marker::STRING => {
                let len: u32 = self.read_value()?;
                self.cursor.read_utf8(len as usize)
            }
            marker::CHAR => Ok(char::from(self.cursor.read_u8()?).to_string()),
            found => Err(Error::UnexpectedMarker {
                expected: marker::STRING,
                found,
                offset,
            }),
        }
    }

    /// Read a tagged string value.
    pub fn read_string(&mut self) -> Result<String> {
        let offset = self.cursor.position();
        let m = self.read_marker()?;
        self.read_string_body(m, offset)
    }

    /// Read an object key (a string without its marker).
    pub fn read_key(&mut self) -> Result<String> {
        let offset = self.cursor.position();
        self.read_string_body(marker::STRING, offset)
    }

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

    /// Read `[ v v ... ]`, each element tagged, until the `]` marker.
    pub fn read_array<T: Numeric>(&mut self) -> Result<Vec<T>> {
        self.expect_marker(marker::ARRAY_START)?;
        let mut out = Vec::new();
        loop {
            let offset = self.cursor.position();
            let m = self.read_marker()?;
            if m == marker::ARRAY_END {
                return Ok(out);
            }
            out.push(self.read_payload(m, offset)?);
        }
    }

    /// Read `[ S.. S.. ]` of tagged strings or chars.
    pub fn read_string_array(&mut self) -> Result<Vec<String>> {
        self.expect_marker(marker::ARRAY_START)?;
        let mut out = Vec::new();
        loop {
            let offset = self.cursor.position();
            let m = self.read_marker()?;
            if m == marker::ARRAY_END {
                return Ok(out);
            }
            out.push(self.read_string_body(m, offset)?);
        }
    }
}
