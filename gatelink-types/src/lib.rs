//! Type definitions for gatelink
//!
//! Plain data shared by the protocol core, the business dispatcher and the
//! adapters: decoded messages, code tables and the result shapes returned to
//! callers.

pub mod codes;
pub mod device;
pub mod error;
pub mod message;
pub mod result;

pub use codes::{
    AccessDirection, AccessLevel, AlarmLevel, DoorStatus, EventType, LivenessResult, LockStatus,
    VerifyMethod, VerifyOutcome,
};
pub use device::DeviceRecord;
pub use error::{Error, Result};
pub use message::{
    DeviceStatus, Envelope, ErrorReport, Heartbeat, Message, MessageType, Payload,
    PermissionRequest, ProcessStatus, RealTimeEvent, VerifyResult,
};
pub use result::{PermissionResult, ProcessResult, ValidationCode, ValidationResult};

/// Opaque key/value payload exchanged with business handlers
pub type BusinessData = serde_json::Map<String, serde_json::Value>;
