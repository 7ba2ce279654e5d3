//! # gatelink-core
//!
//! Wire-level protocol primitives for access-control terminals.
//!
//! This crate provides:
//! - Frame layout, parsing and building with a pluggable checksum
//! - Payload decoders and encoders for every message type
//! - Response frames (ACK, NAK, permission responses, device config)
//! - Fail-fast message validation and device permission checks
//! - Hex conversions for frames logged or relayed as text

pub mod checksum;
pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod field;
pub mod frame;
pub mod hex;
pub mod response;
pub mod validate;

pub use checksum::{Checksum, Crc32, OnesComplementSum, SharedChecksum};
pub use decode::{decode_message, decode_payload};
pub use encode::{encode_message, encode_payload};
pub use error::{BuildError, Error, FrameError, LookupError, Result};
pub use frame::{FrameCodec, FrameHeader, FrameLayout, RawFrame};
pub use response::{ResponseBuilder, ResponseKind};
pub use validate::{DeviceLookup, Validator};
