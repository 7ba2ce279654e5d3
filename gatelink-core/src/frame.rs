//! Frame header/trailer codec
//!
//! # Frame Structure (Entropy V4.8)
//!
//! ```text
//! ┌────────┬────────┬─────────┬───────────┬──────┬─────────┬──────────┬───────────┬─────────┬──────────┐
//! │ Magic  │ Length │ Version │ Device SN │ Type │ Command │ Sequence │ Timestamp │ Payload │ Checksum │
//! │   2    │   2    │    2    │    16     │  1   │    1    │    4     │     8     │    N    │    4     │
//! └────────┴────────┴─────────┴───────────┴──────┴─────────┴──────────┴───────────┴─────────┴──────────┘
//! ```
//!
//! All multi-byte values are little-endian. `Length` is the size of the
//! whole frame including the trailer. The checksum covers every byte before
//! the trailer. The timestamp is unix seconds on the wire and milliseconds in
//! [`FrameHeader`].

use std::fmt;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::{
    checksum::{Crc32, SharedChecksum},
    constants::{entropy_v48, offsets, FIXED_HEADER_FIELDS, MAX_FRAME_SIZE},
    error::{BuildError, FrameError},
    field::{decode_ascii, millis_to_secs, put_padded, secs_to_millis},
};

/// Trailer size in bytes (one u32 checksum)
pub const TRAILER_SIZE: usize = 4;

/// Vendor-specific frame parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Magic value at offset 0
    pub magic: u16,

    /// Version every frame must carry, `None` accepts any
    pub version: Option<u16>,

    /// Width of the padded device serial field
    pub serial_len: usize,
}

impl FrameLayout {
    /// Entropy V4.8 push protocol
    pub const ENTROPY_V48: Self = Self {
        magic: entropy_v48::MAGIC,
        version: Some(entropy_v48::VERSION),
        serial_len: entropy_v48::SERIAL_LEN,
    };

    /// Header size; the payload starts here
    pub const fn header_size(&self) -> usize {
        FIXED_HEADER_FIELDS + self.serial_len
    }

    /// Smallest valid frame: header and trailer with an empty payload
    pub const fn min_frame_size(&self) -> usize {
        self.header_size() + TRAILER_SIZE
    }
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::ENTROPY_V48
    }
}

/// Header fields of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u16,
    pub device_sn: String,
    pub message_type: u8,
    pub command: u8,
    pub sequence: u32,
    /// Unix milliseconds
    pub timestamp_ms: i64,
}

/// Frame split into header, payload and trailer
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub header: FrameHeader,

    /// Bytes between header and trailer
    pub payload: Bytes,

    /// Checksum read from the trailer
    pub checksum: u32,

    /// Header and payload bytes the checksum covers
    pub covered: Bytes,
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("header", &self.header)
            .field("payload_len", &self.payload.len())
            .field("checksum", &format!("0x{:08X}", self.checksum))
            .finish()
    }
}

/// Reads and writes frames of one layout
///
/// Stateless apart from its configuration; parse and build may run
/// concurrently from any number of threads.
///
/// # Examples
///
/// ```
/// use gatelink_core::frame::{FrameCodec, FrameHeader};
///
/// let codec = FrameCodec::default();
/// let header = FrameHeader {
///     version: 0x0480,
///     device_sn: "MA300-0001".into(),
///     message_type: 0x03,
///     command: 0,
///     sequence: 1,
///     timestamp_ms: 1_700_000_000_000,
/// };
///
/// let bytes = codec.build(&header, |_body| Ok(())).unwrap();
/// let frame = codec.parse(&bytes).unwrap();
/// assert_eq!(frame.header, header);
/// assert!(codec.verify(&frame));
/// ```
#[derive(Debug, Clone)]
pub struct FrameCodec {
    layout: FrameLayout,
    checksum: SharedChecksum,
}

impl FrameCodec {
    pub fn new(layout: FrameLayout, checksum: SharedChecksum) -> Self {
        Self { layout, checksum }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn checksum(&self) -> &SharedChecksum {
        &self.checksum
    }

    /// Split a buffer holding exactly one frame
    ///
    /// # Errors
    ///
    /// Checked in order:
    /// - fewer than 2 bytes: [`FrameError::Truncated`]
    /// - wrong magic: [`FrameError::BadMagic`]
    /// - shorter than header and trailer: [`FrameError::Truncated`]
    /// - length field differs from the buffer size: [`FrameError::LengthMismatch`]
    /// - version differs from the pinned one: [`FrameError::UnsupportedVersion`]
    ///
    /// The checksum is not verified here; see [`FrameCodec::verify`].
    pub fn parse(&self, data: &[u8]) -> Result<RawFrame, FrameError> {
        let layout = &self.layout;
        let min_size = layout.min_frame_size();

        debug!(data_len = data.len(), "Parsing frame");

        if data.len() < offsets::LENGTH {
            return Err(FrameError::Truncated {
                expected: min_size,
                actual: data.len(),
            });
        }

        let magic = u16::from_le_bytes([data[0], data[1]]);
        if magic != layout.magic {
            return Err(FrameError::BadMagic {
                expected: layout.magic,
                actual: magic,
            });
        }

        if data.len() < min_size {
            return Err(FrameError::Truncated {
                expected: min_size,
                actual: data.len(),
            });
        }

        let frame = Bytes::copy_from_slice(data);
        let mut buf = frame.slice(offsets::LENGTH..layout.header_size());

        let declared = buf.get_u16_le() as usize;
        if declared != frame.len() {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: frame.len(),
            });
        }

        let version = buf.get_u16_le();
        if let Some(expected) = layout.version {
            if version != expected {
                return Err(FrameError::UnsupportedVersion {
                    expected,
                    actual: version,
                });
            }
        }

        let device_sn = decode_ascii(&buf[..layout.serial_len]);
        buf.advance(layout.serial_len);

        let message_type = buf.get_u8();
        let command = buf.get_u8();
        let sequence = buf.get_u32_le();
        let timestamp_ms = secs_to_millis(buf.get_u64_le());

        let trailer_start = frame.len() - TRAILER_SIZE;
        let mut trailer = frame.slice(trailer_start..);
        let checksum = trailer.get_u32_le();

        let raw = RawFrame {
            header: FrameHeader {
                version,
                device_sn,
                message_type,
                command,
                sequence,
                timestamp_ms,
            },
            payload: frame.slice(layout.header_size()..trailer_start),
            checksum,
            covered: frame.slice(..trailer_start),
        };

        trace!("Parsed: {:?}", raw);

        Ok(raw)
    }

    /// Build a frame around a body
    ///
    /// Writes the header with a placeholder length, runs `body`, patches the
    /// length once the body size is known and appends the checksum of header
    /// and body. If `body` fails or the frame outgrows the 16-bit length
    /// field, the error is returned and no bytes escape.
    pub fn build<F>(&self, header: &FrameHeader, body: F) -> Result<Bytes, BuildError>
    where
        F: FnOnce(&mut BytesMut) -> Result<(), BuildError>,
    {
        let layout = &self.layout;
        let mut buf = BytesMut::with_capacity(layout.min_frame_size() + 64);

        buf.put_u16_le(layout.magic);
        let length_at = buf.len();
        buf.put_u16_le(0);
        buf.put_u16_le(header.version);
        put_padded(&mut buf, &header.device_sn, layout.serial_len)?;
        buf.put_u8(header.message_type);
        buf.put_u8(header.command);
        buf.put_u32_le(header.sequence);
        buf.put_u64_le(millis_to_secs(header.timestamp_ms));

        body(&mut buf)?;

        let total = buf.len() + TRAILER_SIZE;
        let length = u16::try_from(total).map_err(|_| {
            BuildError::EncodingFailure(format!(
                "frame of {total} bytes exceeds {MAX_FRAME_SIZE} bytes"
            ))
        })?;
        buf[length_at..length_at + 2].copy_from_slice(&length.to_le_bytes());

        let checksum = self.checksum.compute(&buf);
        buf.put_u32_le(checksum);

        debug!(
            frame_len = buf.len(),
            message_type = header.message_type,
            "Built frame"
        );

        Ok(buf.freeze())
    }

    /// Check a parsed frame's trailer against its contents
    pub fn verify(&self, frame: &RawFrame) -> bool {
        self.checksum.verify(&frame.covered, frame.checksum)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(FrameLayout::ENTROPY_V48, Arc::new(Crc32))
    }
}
