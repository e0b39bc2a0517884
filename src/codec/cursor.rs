//! Sequential big-endian reader and writer over in-memory buffers.
//!
//! The packed format follows Java's `DataInput`/`DataOutput` conventions:
//! chars are 2-byte code units, strings are prefixed with an unsigned
//! 2-byte length, and every multi-byte number is big-endian.

use crate::utils::error::CodecError;

/// Reads primitives from a fully materialized buffer
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the current offset
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::TruncatedBuffer {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a 2-byte code unit as a char
    pub fn read_char(&mut self) -> Result<char, CodecError> {
        let unit = self.read_unsigned_short()?;
        char::from_u32(u32::from(unit)).ok_or_else(|| {
            CodecError::InvalidFormat(format!("invalid char code unit {:#06x}", unit))
        })
    }

    pub fn read_unsigned_short(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_be_bytes(self.take_array()?))
    }

    /// Read a non-negative count, rejecting negative values
    pub fn read_count(&mut self, what: &str) -> Result<usize, CodecError> {
        let offset = self.pos;
        let value = self.read_i32()?;
        usize::try_from(value).map_err(|_| {
            CodecError::MalformedDocument(format!(
                "negative {} ({}) at offset {}",
                what, value, offset
            ))
        })
    }

    /// Read a 2-byte length followed by that many raw bytes
    pub fn read_length_prefixed_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = usize::from(self.read_unsigned_short()?);
        self.take(len)
    }

    /// Read a length-prefixed string
    pub fn read_utf(&mut self) -> Result<String, CodecError> {
        let offset = self.pos;
        let bytes = self.read_length_prefixed_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            CodecError::InvalidFormat(format!("invalid string at offset {}: {}", offset, e))
        })
    }

    /// Advance without interpreting the skipped bytes
    pub fn skip(&mut self, n: usize) -> Result<(), CodecError> {
        self.take(n).map(|_| ())
    }
}

/// Appends primitives to a growable output buffer
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Write a char as one 2-byte code unit
    pub fn write_char(&mut self, c: char) -> Result<(), CodecError> {
        let unit = u16::try_from(u32::from(c)).map_err(|_| {
            CodecError::InvalidFormat(format!("char `{}` does not fit in one code unit", c))
        })?;
        self.write_unsigned_short(unit);
        Ok(())
    }

    pub fn write_unsigned_short(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a count as an int32
    pub fn write_count(&mut self, count: usize) -> Result<(), CodecError> {
        let value = i32::try_from(count).map_err(|_| {
            CodecError::MalformedDocument(format!("count {} exceeds int32 range", count))
        })?;
        self.write_i32(value);
        Ok(())
    }

    pub fn write_length_prefixed_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        let len = u16::try_from(bytes.len()).map_err(|_| {
            CodecError::InvalidFormat(format!(
                "string of {} bytes exceeds the 65535 byte limit",
                bytes.len()
            ))
        })?;
        self.write_unsigned_short(len);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_utf(&mut self, s: &str) -> Result<(), CodecError> {
        self.write_length_prefixed_bytes(s.as_bytes())
    }

    /// Append `n` copies of `byte`
    pub fn write_padding(&mut self, n: usize, byte: u8) {
        self.buf.resize(self.buf.len() + n, byte);
    }
}
