//! Protocol constants

/// Entropy V4.8 access-control push protocol
pub mod entropy_v48 {
    /// "HE" frame magic
    pub const MAGIC: u16 = 0x4845;

    /// Protocol version 4.8
    pub const VERSION: u16 = 0x0480;

    /// Width of the device serial field
    pub const SERIAL_LEN: usize = 16;

    /// Payload offset (header size)
    pub const HEADER_SIZE: usize = 36;

    /// Message type written into response headers
    pub const RESPONSE_MESSAGE_TYPE: u8 = 0x00;
}

/// Header field offsets shared by every layout
pub mod offsets {
    pub const MAGIC: usize = 0;
    pub const LENGTH: usize = 2;
    pub const VERSION: usize = 4;
    pub const SERIAL: usize = 6;
}

/// Fixed header bytes besides the serial field:
/// magic, length, version, type, command, sequence, timestamp
pub const FIXED_HEADER_FIELDS: usize = 2 + 2 + 2 + 1 + 1 + 4 + 8;

/// Card number field width in real-time events
pub const CARD_NUMBER_LEN: usize = 20;

/// Session id field width in verify results
pub const SESSION_ID_LEN: usize = 16;

/// Largest frame the 16-bit length field can describe
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// Default tolerated distance between device and receive time (5 minutes)
pub const DEFAULT_MAX_CLOCK_SKEW_MS: i64 = 5 * 60 * 1000;
