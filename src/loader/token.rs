//! Byte cursor and numeric targets shared by the binary token readers.
//!
//! Both binary formats read values whose on-disk width is chosen by a
//! marker byte. The caller decides the target type, and a source wider
//! than the target is a hard failure rather than a silent truncation.

use std::marker::PhantomData;

use byteorder::ByteOrder;

use crate::util::{Error, Result};

// ============================================================================
// Decoded values
// ============================================================================

/// A scalar decoded from the stream before conversion to the target type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

/// A numeric type a binary value can be read into.
pub trait Numeric: Copy + Default {
    /// Byte width of the target.
    const WIDTH: usize;

    /// Convert a decoded scalar, following plain numeric `as` casts.
    fn from_scalar(value: Scalar) -> Self;

    /// Read the target's own native representation.
    fn read_native<O: ByteOrder>(cursor: &mut ByteCursor<'_, O>) -> Result<Self>;
}

macro_rules! impl_numeric {
    ($ty:ty, $width:expr, |$c:ident| $native:expr) => {
        impl Numeric for $ty {
            const WIDTH: usize = $width;

            #[inline]
            fn from_scalar(value: Scalar) -> Self {
                match value {
                    Scalar::Null => <$ty>::default(),
                    Scalar::Bool(b) => (b as u8) as $ty,
                    Scalar::Int(i) => i as $ty,
                    Scalar::UInt(u) => u as $ty,
                    Scalar::Float(f) => f as $ty,
                }
            }

            #[inline]
            fn read_native<O: ByteOrder>($c: &mut ByteCursor<'_, O>) -> Result<Self> {
                $native
            }
        }
    };
}

impl_numeric!(u8, 1, |c| c.read_u8());
impl_numeric!(u16, 2, |c| c.read_u16());
impl_numeric!(u32, 4, |c| c.read_u32());
impl_numeric!(i32, 4, |c| c.read_i32());
impl_numeric!(f32, 4, |c| c.read_f32());
impl_numeric!(f64, 8, |c| c.read_f64());

/// Fail when a `source_width`-byte value cannot fit in `T`.
#[inline]
pub fn check_width<T: Numeric>(source_width: usize) -> Result<()> {
    if source_width > T::WIDTH {
        return Err(Error::ValueTooNarrow {
            source_width,
            target_width: T::WIDTH,
        });
    }
    Ok(())
}

// ============================================================================
// Cursor
// ============================================================================

/// Forward-only cursor over an in-memory byte buffer with a fixed byte order.
#[derive(Debug)]
pub struct ByteCursor<'a, O> {
    data: &'a [u8],
    pos: usize,
    _order: PhantomData<O>,
}

impl<'a, O: ByteOrder> ByteCursor<'a, O> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            _order: PhantomData,
        }
    }

    /// Current offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(Error::UnexpectedEof(self.pos))?;
        if end > self.data.len() {
            return Err(Error::UnexpectedEof(self.pos));
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Look at the next byte without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(O::read_u16(self.take(2)?))
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(O::read_i16(self.take(2)?))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(O::read_u32(self.take(4)?))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(O::read_i32(self.take(4)?))
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(O::read_u64(self.take(8)?))
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(O::read_i64(self.take(8)?))
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(O::read_f32(self.take(4)?))
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(O::read_f64(self.take(8)?))
    }

    /// Read `len` bytes as UTF-8.
    pub fn read_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, LittleEndian};

    #[test]
    fn test_read_le_be() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        let mut le = ByteCursor::<LittleEndian>::new(&bytes);
        assert_eq!(le.read_u32().unwrap(), 0x04030201);
        assert!(le.at_end());

        let mut be = ByteCursor::<BigEndian>::new(&bytes);
        assert_eq!(be.read_u16().unwrap(), 0x0102);
        assert_eq!(be.position(), 2);
        assert_eq!(be.peek(), Some(0x03));
    }

    #[test]
    fn test_short_read() {
        let bytes = [0x01, 0x02];
        let mut c = ByteCursor::<LittleEndian>::new(&bytes);
        assert!(matches!(c.read_u32(), Err(Error::UnexpectedEof(0))));
        // Failed reads leave the cursor in place
        assert_eq!(c.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn test_check_width() {
        assert!(check_width::<f32>(4).is_ok());
        assert!(check_width::<u16>(1).is_ok());
        assert!(matches!(
            check_width::<f32>(8),
            Err(Error::ValueTooNarrow { source_width: 8, target_width: 4 })
        ));
    }

    #[test]
    fn test_from_scalar() {
        assert_eq!(f32::from_scalar(Scalar::Int(-3)), -3.0);
        assert_eq!(u32::from_scalar(Scalar::Float(2.9)), 2);
        assert_eq!(u8::from_scalar(Scalar::Bool(true)), 1);
        assert_eq!(f32::from_scalar(Scalar::Null), 0.0);
    }
}
