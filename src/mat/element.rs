//! Data element framing and numeric payload decoding.

use std::io::Cursor;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};

use super::MatError;

pub(crate) const MI_INT8: u32 = 1;
pub(crate) const MI_UINT8: u32 = 2;
pub(crate) const MI_INT16: u32 = 3;
pub(crate) const MI_UINT16: u32 = 4;
pub(crate) const MI_INT32: u32 = 5;
pub(crate) const MI_UINT32: u32 = 6;
pub(crate) const MI_SINGLE: u32 = 7;
pub(crate) const MI_DOUBLE: u32 = 9;
pub(crate) const MI_INT64: u32 = 12;
pub(crate) const MI_UINT64: u32 = 13;
pub(crate) const MI_MATRIX: u32 = 14;
pub(crate) const MI_COMPRESSED: u32 = 15;
pub(crate) const MI_UTF8: u32 = 16;
pub(crate) const MI_UTF16: u32 = 17;
pub(crate) const MI_UTF32: u32 = 18;

/// Byte order declared by the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Header indicator `IM`
    Little,
    /// Header indicator `MI`
    Big,
}

impl Endian {
    pub(crate) fn u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(buf),
            Endian::Big => BigEndian::read_u16(buf),
        }
    }

    pub(crate) fn u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    pub(crate) fn i32(self, buf: &[u8]) -> i32 {
        match self {
            Endian::Little => LittleEndian::read_i32(buf),
            Endian::Big => BigEndian::read_i32(buf),
        }
    }
}

/// One tagged data element borrowed from its container.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Element<'a> {
    pub(crate) data_type: u32,
    pub(crate) data: &'a [u8],
}

/// Sequential reader over the data elements of a byte buffer.
pub(crate) struct ElementReader<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ElementReader<'a> {
    pub(crate) fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self { buf, pos: 0, endian }
    }

    /// Next element, or `None` once the buffer is exhausted.
    ///
    /// Handles both the regular 8-byte tag and the packed small-element
    /// form (type and size sharing the first word, payload in the second).
    pub(crate) fn next_element(&mut self) -> Result<Option<Element<'a>>, MatError> {
        let remaining = self.buf.len() - self.pos;
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < 8 {
            // Trailing alignment bytes
            if self.buf[self.pos..].iter().all(|b| *b == 0) {
                self.pos = self.buf.len();
                return Ok(None);
            }
            return Err(self.truncated(8));
        }

        let start = self.pos;
        let first = self.endian.u32(&self.buf[start..start + 4]);
        let packed_size = (first >> 16) as usize;

        if packed_size != 0 {
            if packed_size > 4 {
                return Err(MatError::Malformed(format!(
                    "small element at offset {start} declares {packed_size} bytes"
                )));
            }
            self.pos = start + 8;
            return Ok(Some(Element {
                data_type: first & 0xFFFF,
                data: &self.buf[start + 4..start + 4 + packed_size],
            }));
        }

        let data_type = first;
        let size = self.endian.u32(&self.buf[start + 4..start + 8]) as usize;
        let data_start = start + 8;
        if size > self.buf.len() - data_start {
            return Err(self.truncated(size));
        }

        // Compressed elements are not padded to the 8-byte boundary
        let padded = if data_type == MI_COMPRESSED {
            size
        } else {
            size.div_ceil(8) * 8
        };
        self.pos = (data_start + padded).min(self.buf.len());

        Ok(Some(Element {
            data_type,
            data: &self.buf[data_start..data_start + size],
        }))
    }

    /// Next element, failing if the buffer is exhausted.
    pub(crate) fn expect_element(&mut self, what: &str) -> Result<Element<'a>, MatError> {
        self.next_element()?
            .ok_or_else(|| MatError::Malformed(format!("missing {what} element")))
    }

    pub(crate) fn endian(&self) -> Endian {
        self.endian
    }

    /// Bytes not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn truncated(&self, needed: usize) -> MatError {
        MatError::Truncated {
            offset: self.pos,
            needed,
            available: self.buf.len() - self.pos,
        }
    }
}

/// Byte width of one value of a numeric data type.
pub(crate) fn value_width(data_type: u32) -> Result<usize, MatError> {
    match data_type {
        MI_INT8 | MI_UINT8 | MI_UTF8 => Ok(1),
        MI_INT16 | MI_UINT16 | MI_UTF16 => Ok(2),
        MI_INT32 | MI_UINT32 | MI_SINGLE | MI_UTF32 => Ok(4),
        MI_DOUBLE | MI_INT64 | MI_UINT64 => Ok(8),
        other => Err(MatError::UnsupportedDataType(other)),
    }
}

/// Decode a numeric payload of any integer or floating data type as `f64`.
pub(crate) fn decode_numbers(element: &Element<'_>, endian: Endian) -> Result<Vec<f64>, MatError> {
    match endian {
        Endian::Little => numbers::<LittleEndian>(element),
        Endian::Big => numbers::<BigEndian>(element),
    }
}

fn numbers<E: ByteOrder>(element: &Element<'_>) -> Result<Vec<f64>, MatError> {
    let width = value_width(element.data_type)?;
    let count = element.data.len() / width;
    let mut values = Vec::with_capacity(count);
    let mut cursor = Cursor::new(element.data);

    for _ in 0..count {
        let value = match element.data_type {
            MI_INT8 => cursor.read_i8()? as f64,
            MI_UINT8 | MI_UTF8 => cursor.read_u8()? as f64,
            MI_INT16 => cursor.read_i16::<E>()? as f64,
            MI_UINT16 | MI_UTF16 => cursor.read_u16::<E>()? as f64,
            MI_INT32 => cursor.read_i32::<E>()? as f64,
            MI_UINT32 | MI_UTF32 => cursor.read_u32::<E>()? as f64,
            MI_SINGLE => cursor.read_f32::<E>()? as f64,
            MI_DOUBLE => cursor.read_f64::<E>()?,
            MI_INT64 => cursor.read_i64::<E>()? as f64,
            MI_UINT64 => cursor.read_u64::<E>()? as f64,
            other => return Err(MatError::UnsupportedDataType(other)),
        };
        values.push(value);
    }

    Ok(values)
}
