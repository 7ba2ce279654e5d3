//! Decoded protocol messages
//!
//! A [`Message`] is one inbound frame: the header-derived [`Envelope`] shared
//! by every message type plus exactly one [`Payload`] variant selected by the
//! message-type code.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::codes::{
    AccessDirection, AccessLevel, AlarmLevel, DoorStatus, EventType, LivenessResult, LockStatus,
    VerifyMethod, VerifyOutcome,
};
use crate::error::{Error, Result};
use crate::BusinessData;

/// Message-type codes understood by the decoders
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    RealTimeEvent = 0x01,
    DeviceStatus = 0x02,
    Heartbeat = 0x03,
    PermissionRequest = 0x04,
    VerifyResult = 0x05,
    ErrorReport = 0x06,
}

impl MessageType {
    /// Lowest known message-type code
    pub const FIRST: u8 = 0x01;

    /// Highest known message-type code
    pub const LAST: u8 = 0x06;

    /// Check if a raw code falls in the known range
    pub fn is_known_code(code: u8) -> bool {
        (Self::FIRST..=Self::LAST).contains(&code)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RealTimeEvent => "REAL_TIME_EVENT",
            Self::DeviceStatus => "DEVICE_STATUS",
            Self::Heartbeat => "HEARTBEAT",
            Self::PermissionRequest => "PERMISSION_REQUEST",
            Self::VerifyResult => "VERIFY_RESULT",
            Self::ErrorReport => "ERROR_REPORT",
        }
    }
}

impl From<MessageType> for u8 {
    fn from(message_type: MessageType) -> u8 {
        message_type as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::RealTimeEvent),
            0x02 => Ok(Self::DeviceStatus),
            0x03 => Ok(Self::Heartbeat),
            0x04 => Ok(Self::PermissionRequest),
            0x05 => Ok(Self::VerifyResult),
            0x06 => Ok(Self::ErrorReport),
            _ => Err(Error::UnknownMessageType(value)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// Processing state of an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    #[default]
    Received,
    Validated,
    Rejected,
    Dispatched,
}

/// Header fields common to every frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Device identifier supplied by the transport/session layer
    pub device_id: i64,

    /// Serial number written by the device into the frame header
    pub device_sn: String,

    /// Device model, when known to the caller
    pub device_model: Option<String>,

    /// Protocol version field
    pub version: u16,

    /// Raw message-type code
    pub message_type: u8,

    /// Raw command code
    pub command: u8,

    pub sequence: u32,

    /// Device-side timestamp in unix milliseconds
    pub timestamp_ms: i64,

    /// Time the frame was handed to the decoder
    pub received_at: DateTime<Utc>,

    pub process_status: ProcessStatus,

    pub retry_count: u32,

    /// Checksum carried in the frame trailer
    pub checksum: Option<u32>,
}

impl Envelope {
    /// Create an envelope received now, with every other field defaulted
    pub fn new(device_id: i64, device_sn: impl Into<String>, message_type: u8) -> Self {
        Self {
            device_id,
            device_sn: device_sn.into(),
            device_model: None,
            version: 0,
            message_type,
            command: 0,
            sequence: 0,
            timestamp_ms: 0,
            received_at: Utc::now(),
            process_status: ProcessStatus::Received,
            retry_count: 0,
            checksum: None,
        }
    }

    /// Resolve the message-type code, `None` for codes outside the table
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::try_from(self.message_type).ok()
    }

    /// Device-side timestamp as a date, `None` if out of range
    pub fn device_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// Card, face, fingerprint or other access event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealTimeEvent {
    pub event_type: EventType,
    pub event_number: u64,
    pub user_id: Option<u32>,
    pub card_number: Option<String>,
    pub verify_method: VerifyMethod,
    pub verify_result: VerifyOutcome,
    /// Face match confidence in percent
    pub face_confidence: f32,
    pub liveness_result: LivenessResult,
    /// Liveness confidence in percent
    pub liveness_confidence: f32,
    pub access_point_id: Option<u32>,
    pub direction: AccessDirection,
    pub access_time: Option<DateTime<Utc>>,
}

/// Device status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub device_state: u8,
    pub door: DoorStatus,
    pub lock: LockStatus,
    pub online: bool,
    /// Battery level in percent
    pub battery_level: u8,
    pub signal_strength: u8,
    pub cpu_usage: u16,
    pub memory_usage: u16,
    pub storage_space: u32,
    pub error_code: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heartbeat {
    pub interval_secs: u16,
    pub uptime_secs: u32,
    pub connection_status: u8,
    pub temperature: i16,
    pub humidity: i16,
}

/// Device asking whether a user may pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRequest {
    pub user_id: u32,
    pub access_level: AccessLevel,
    pub permission_group_id: u32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub multi_factor_required: bool,
    pub anti_passback_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyResult {
    pub result: VerifyOutcome,
    pub match_score: i16,
    pub failure_reason: u8,
    /// Time the device spent verifying, in milliseconds
    pub process_time_ms: u32,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error_code: u32,
    pub level: AlarmLevel,
    pub description: Option<String>,
}

/// Message body, selected by the message-type code
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payload {
    RealTimeEvent(RealTimeEvent),
    DeviceStatus(DeviceStatus),
    Heartbeat(Heartbeat),
    PermissionRequest(PermissionRequest),
    VerifyResult(VerifyResult),
    ErrorReport(ErrorReport),
    /// Message type not understood; only the envelope was decoded
    Empty,
}

impl Payload {
    /// Message type this payload is carried under
    pub fn message_type(&self) -> Option<MessageType> {
        match self {
            Self::RealTimeEvent(_) => Some(MessageType::RealTimeEvent),
            Self::DeviceStatus(_) => Some(MessageType::DeviceStatus),
            Self::Heartbeat(_) => Some(MessageType::Heartbeat),
            Self::PermissionRequest(_) => Some(MessageType::PermissionRequest),
            Self::VerifyResult(_) => Some(MessageType::VerifyResult),
            Self::ErrorReport(_) => Some(MessageType::ErrorReport),
            Self::Empty => None,
        }
    }

    /// Business type a handler registry routes this payload under
    pub fn business_type(&self) -> Option<&'static str> {
        match self {
            Self::RealTimeEvent(_) => Some("REAL_TIME_EVENT"),
            Self::DeviceStatus(_) => Some("DEVICE_STATUS"),
            Self::Heartbeat(_) => Some("HEARTBEAT"),
            Self::PermissionRequest(_) => Some("PERMISSION_REQUEST"),
            Self::VerifyResult(_) => Some("ACCESS_VERIFY"),
            Self::ErrorReport(_) => Some("ALARM_EVENT"),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// One decoded inbound frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(flatten)]
    pub envelope: Envelope,

    pub payload: Payload,

    /// Header and payload bytes covered by the trailer checksum
    #[serde(skip)]
    pub frame: Bytes,
}

impl Message {
    pub fn new(envelope: Envelope, payload: Payload) -> Self {
        Self {
            envelope,
            payload,
            frame: Bytes::new(),
        }
    }

    /// Attach the checksummed frame bytes
    pub fn with_frame(mut self, frame: impl Into<Bytes>) -> Self {
        self.frame = frame.into();
        self
    }

    /// Check if only the envelope could be decoded
    pub fn is_degraded(&self) -> bool {
        self.payload.is_empty()
    }

    /// Serialize the message into the key/value shape business handlers take
    pub fn to_business_data(&self) -> Result<BusinessData> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(Error::NotAnObject),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self
            .payload
            .message_type()
            .map(MessageType::name)
            .unwrap_or("UNKNOWN");
        write!(
            f,
            "Message[{}](sn={}, type=0x{:02X}, seq={})",
            kind, self.envelope.device_sn, self.envelope.message_type, self.envelope.sequence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heartbeat_message() -> Message {
        let mut envelope = Envelope::new(7, "SN0001", MessageType::Heartbeat.code());
        envelope.sequence = 42;
        let payload = Payload::Heartbeat(Heartbeat {
            interval_secs: 30,
            uptime_secs: 3600,
            connection_status: 1,
            temperature: 25,
            humidity: 40,
        });
        Message::new(envelope, payload)
    }

    #[test]
    fn test_message_type_conversion() {
        assert_eq!(u8::from(MessageType::VerifyResult), 0x05);
        assert_eq!(MessageType::try_from(0x02).unwrap(), MessageType::DeviceStatus);
        assert!(MessageType::try_from(0x09).is_err());
        assert!(!MessageType::is_known_code(0x00));
        assert!(MessageType::is_known_code(0x06));
    }

    #[test]
    fn test_payload_routing() {
        let message = heartbeat_message();
        assert_eq!(message.payload.business_type(), Some("HEARTBEAT"));
        assert_eq!(message.envelope.message_type(), Some(MessageType::Heartbeat));
        assert!(!message.is_degraded());
        assert_eq!(Payload::Empty.business_type(), None);
    }

    #[test]
    fn test_to_business_data() {
        let data = heartbeat_message().to_business_data().unwrap();

        assert_eq!(data["device_sn"], "SN0001");
        assert_eq!(data["sequence"], 42);
        assert_eq!(data["payload"]["kind"], "HEARTBEAT");
        assert_eq!(data["payload"]["data"]["uptime_secs"], 3600);
        assert!(!data.contains_key("frame"));
    }

    #[test]
    fn test_display() {
        let text = heartbeat_message().to_string();
        assert_eq!(text, "Message[HEARTBEAT](sn=SN0001, type=0x03, seq=42)");
    }
}
