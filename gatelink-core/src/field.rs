//! Fixed-width field primitives
//!
//! All multi-byte fields are little-endian. Reads are bounds-checked and fail
//! with [`FrameError::Truncated`] instead of panicking on short payloads.

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};

use crate::error::{BuildError, FrameError};

/// Sequential reader over a payload
#[derive(Debug)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take the next `n` bytes
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        if self.remaining() < n {
            return Err(FrameError::Truncated {
                expected: self.pos + n,
                actual: self.buf.len(),
            });
        }

        let field = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(field)
    }

    pub fn u8(&mut self) -> Result<u8, FrameError> {
        self.take(1).map(|b| b[0])
    }

    pub fn u16(&mut self) -> Result<u16, FrameError> {
        self.take(2).map(LittleEndian::read_u16)
    }

    pub fn i16(&mut self) -> Result<i16, FrameError> {
        self.take(2).map(LittleEndian::read_i16)
    }

    pub fn u32(&mut self) -> Result<u32, FrameError> {
        self.take(4).map(LittleEndian::read_u32)
    }

    pub fn i32(&mut self) -> Result<i32, FrameError> {
        self.take(4).map(LittleEndian::read_i32)
    }

    pub fn u64(&mut self) -> Result<u64, FrameError> {
        self.take(8).map(LittleEndian::read_u64)
    }

    /// Single byte flag, set when equal to 1
    pub fn flag(&mut self) -> Result<bool, FrameError> {
        self.u8().map(|b| b == 1)
    }

    /// Padded ASCII field of fixed width, trimmed
    pub fn ascii(&mut self, width: usize) -> Result<String, FrameError> {
        self.take(width).map(decode_ascii)
    }

    /// Identifier where zero or negative means absent
    pub fn optional_id(&mut self) -> Result<Option<u32>, FrameError> {
        self.i32().map(|v| u32::try_from(v).ok().filter(|&v| v > 0))
    }

    /// Unix-seconds timestamp, zero means absent
    pub fn timestamp(&mut self) -> Result<Option<DateTime<Utc>>, FrameError> {
        self.u64().map(datetime_from_secs)
    }

    /// Confidence stored as hundredths of a percent
    pub fn confidence(&mut self) -> Result<f32, FrameError> {
        self.i16().map(|v| v as f32 / 100.0)
    }
}

/// Decode a NUL/space padded ASCII field
pub fn decode_ascii(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// Write `value` NUL-padded to exactly `width` bytes
pub fn put_padded(buf: &mut BytesMut, value: &str, width: usize) -> Result<(), BuildError> {
    let bytes = value.as_bytes();
    if bytes.len() > width {
        return Err(BuildError::encoding(format!(
            "{value:?} is {} bytes, field holds {width}",
            bytes.len()
        )));
    }

    buf.put_slice(bytes);
    buf.put_bytes(0, width - bytes.len());
    Ok(())
}

/// Write a string prefixed with its u16 byte length
pub fn put_str_u16(buf: &mut BytesMut, value: &str) -> Result<(), BuildError> {
    let len = u16::try_from(value.len())
        .map_err(|_| BuildError::encoding(format!("string of {} bytes too long", value.len())))?;
    buf.put_u16_le(len);
    buf.put_slice(value.as_bytes());
    Ok(())
}

/// Write a string prefixed with its u8 byte length
pub fn put_str_u8(buf: &mut BytesMut, value: &str) -> Result<(), BuildError> {
    let len = u8::try_from(value.len())
        .map_err(|_| BuildError::encoding(format!("string of {} bytes too long", value.len())))?;
    buf.put_u8(len);
    buf.put_slice(value.as_bytes());
    Ok(())
}

/// Confidence in percent back to hundredths
pub fn confidence_to_raw(confidence: f32) -> i16 {
    (confidence * 100.0).round() as i16
}

/// Seconds on the wire to milliseconds, saturating
pub fn secs_to_millis(secs: u64) -> i64 {
    i64::try_from(secs)
        .ok()
        .and_then(|s| s.checked_mul(1000))
        .unwrap_or(i64::MAX)
}

/// Milliseconds back to wire seconds, negative clamps to zero
pub fn millis_to_secs(millis: i64) -> u64 {
    u64::try_from(millis.div_euclid(1000)).unwrap_or(0)
}

pub fn datetime_from_secs(secs: u64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
}

pub fn datetime_to_secs(time: Option<DateTime<Utc>>) -> u64 {
    time.map(|t| u64::try_from(t.timestamp()).unwrap_or(0))
        .unwrap_or(0)
}
