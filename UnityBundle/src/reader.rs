//! Endian-aware cursor over a byte slice
//!
//! UnityFS headers are big-endian while serialized files declare their own
//! byte order, so every read goes through this one type.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Byte order of the data being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Cursor over a borrowed byte slice
#[derive(Debug, Clone)]
pub struct EndianReader<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

macro_rules! read_fixed {
    ($name:ident, $ty:ty, $size:expr, $method:ident) => {
        #[doc = concat!("Read a `", stringify!($ty), "` in the current byte order")]
        pub fn $name(&mut self) -> Result<$ty> {
            let bytes = self.read_bytes($size)?;
            Ok(match self.endian {
                Endian::Little => LittleEndian::$method(bytes),
                Endian::Big => BigEndian::$method(bytes),
            })
        }
    };
}

impl<'a> EndianReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self { data, pos: 0, endian }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Move to an absolute position
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::UnexpectedEof {
                offset: pos,
                wanted: 0,
                available: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Advance to the next multiple of `alignment` (relative to the slice start)
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let rem = self.pos % alignment;
        if rem != 0 {
            self.skip(alignment - rem)?;
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(count).filter(|&end| end <= self.data.len());
        let Some(end) = end else {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                wanted: count,
                available: self.remaining(),
            });
        };
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    read_fixed!(read_u16, u16, 2, read_u16);
    read_fixed!(read_i16, i16, 2, read_i16);
    read_fixed!(read_u32, u32, 4, read_u32);
    read_fixed!(read_i32, i32, 4, read_i32);
    read_fixed!(read_u64, u64, 8, read_u64);
    read_fixed!(read_i64, i64, 8, read_i64);
    read_fixed!(read_f32, f32, 4, read_f32);

    /// Read a NUL-terminated string (lossy UTF-8)
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let Some(len) = rest.iter().position(|&b| b == 0) else {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                wanted: rest.len() + 1,
                available: rest.len(),
            });
        };
        let text = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += len + 1;
        Ok(text)
    }

    /// Read an `i32` length that must not be negative
    pub fn read_length(&mut self) -> Result<usize> {
        let offset = self.pos;
        let length = self.read_i32()?;
        usize::try_from(length).map_err(|_| Error::InvalidLength {
            length: i64::from(length),
            offset,
        })
    }

    /// Read a length-prefixed byte array followed by 4-byte alignment
    pub fn read_aligned_bytes(&mut self) -> Result<&'a [u8]> {
        let length = self.read_length()?;
        let bytes = self.read_bytes(length)?;
        self.align(4)?;
        Ok(bytes)
    }

    /// Read a length-prefixed string followed by 4-byte alignment
    pub fn read_aligned_string(&mut self) -> Result<String> {
        let bytes = self.read_aligned_bytes()?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
