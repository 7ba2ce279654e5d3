//! Error types for gatelink-core

/// Result type alias for gatelink-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to turn bytes into a frame
///
/// Fatal to the frame being parsed; the core never retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Buffer ends before a header, trailer or payload field
    #[error("Frame truncated: expected at least {expected} bytes, got {actual} bytes")]
    Truncated { expected: usize, actual: usize },

    /// First two bytes are not the protocol magic
    #[error("Bad magic: expected 0x{expected:04X}, got 0x{actual:04X}")]
    BadMagic { expected: u16, actual: u16 },

    /// Length field disagrees with the buffer size
    #[error("Length mismatch: header declares {declared} bytes, frame has {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    /// Version field differs from the one the layout pins
    #[error("Unsupported protocol version: expected 0x{expected:04X}, got 0x{actual:04X}")]
    UnsupportedVersion { expected: u16, actual: u16 },

    /// Hex input is empty, odd-length or contains a non-hex character
    #[error("Invalid hex format: {0}")]
    InvalidHexFormat(String),
}

/// Failure to build an outbound frame
///
/// No bytes are produced when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Unknown response kind: {0}")]
    UnknownResponseKind(String),

    #[error("Encoding failure: {0}")]
    EncodingFailure(String),
}

impl BuildError {
    pub(crate) fn encoding(reason: impl Into<String>) -> Self {
        Self::EncodingFailure(reason.into())
    }
}

/// Failure reported by a device lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Device lookup failed: {0}")]
pub struct LookupError(pub String);

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl Error {
    /// Check if the error came from decoding an inbound frame
    pub fn is_frame_error(&self) -> bool {
        matches!(self, Self::Frame(_))
    }

    /// Check if the device should be answered with a NAK
    ///
    /// Build failures are local and never reported to the device.
    pub fn should_nak(&self) -> bool {
        matches!(
            self,
            Self::Frame(
                FrameError::LengthMismatch { .. }
                    | FrameError::Truncated { .. }
                    | FrameError::UnsupportedVersion { .. }
            )
        )
    }
}
