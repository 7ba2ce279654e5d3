//! Outbound response frames
//!
//! A response body starts with a one-byte kind tag followed by kind-specific
//! fields taken from an opaque key/value payload:
//!
//! ```text
//! ACK                  0x01 | sequence u32 | code u8
//! NAK                  0x02 | sequence u32 | error_code u16 | reason (u16 len + UTF-8)
//! PERMISSION_RESPONSE  0x03 | user_id u32 | granted u8 | access_level u8
//!                           | valid_from u64 | valid_until u64 | open_duration u16
//! DEVICE_CONFIG        0x04 | count u16 | count × (key: u8 len + UTF-8, value: u16 len + UTF-8)
//! ```
//!
//! Header and trailer are finalized by [`FrameCodec::build`], so a failed
//! response never yields a partial buffer.

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use gatelink_types::{AccessLevel, BusinessData};

use crate::{
    constants::entropy_v48::{RESPONSE_MESSAGE_TYPE, VERSION},
    error::BuildError,
    field::{put_str_u16, put_str_u8},
    frame::{FrameCodec, FrameHeader},
};

/// Response kinds a device understands
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseKind {
    Ack = 0x01,
    Nak = 0x02,
    PermissionResponse = 0x03,
    DeviceConfig = 0x04,
}

impl ResponseKind {
    /// Tag byte opening the response body
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ack => "ACK",
            Self::Nak => "NAK",
            Self::PermissionResponse => "PERMISSION_RESPONSE",
            Self::DeviceConfig => "DEVICE_CONFIG",
        }
    }
}

impl FromStr for ResponseKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACK" => Ok(Self::Ack),
            "NAK" => Ok(Self::Nak),
            "PERMISSION_RESPONSE" => Ok(Self::PermissionResponse),
            "DEVICE_CONFIG" => Ok(Self::DeviceConfig),
            _ => Err(BuildError::UnknownResponseKind(s.to_string())),
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// Keys read from the payload for the response header
const KEY_DEVICE_SN: &str = "device_sn";
const KEY_SEQUENCE: &str = "sequence";

/// Default door open duration for granted permissions, in seconds
const DEFAULT_OPEN_DURATION_SECS: u64 = 5;

/// Builds response frames for one frame layout
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    codec: FrameCodec,
}

impl ResponseBuilder {
    pub fn new(codec: FrameCodec) -> Self {
        Self { codec }
    }

    /// Build a response stamped with the current time
    pub fn build(&self, kind: ResponseKind, data: &BusinessData) -> Result<Bytes, BuildError> {
        self.build_at(kind, data, Utc::now())
    }

    /// Build a response stamped with `now`
    pub fn build_at(
        &self,
        kind: ResponseKind,
        data: &BusinessData,
        now: DateTime<Utc>,
    ) -> Result<Bytes, BuildError> {
        let header = FrameHeader {
            version: self.codec.layout().version.unwrap_or(VERSION),
            device_sn: optional_str(data, KEY_DEVICE_SN)?.unwrap_or_default().to_string(),
            message_type: RESPONSE_MESSAGE_TYPE,
            command: kind.tag(),
            sequence: uint(data, KEY_SEQUENCE, Some(0), u32::MAX as u64)? as u32,
            timestamp_ms: now.timestamp_millis(),
        };

        let result = self.codec.build(&header, |buf| {
            buf.put_u8(kind.tag());
            match kind {
                ResponseKind::Ack => ack(data, buf),
                ResponseKind::Nak => nak(data, buf),
                ResponseKind::PermissionResponse => permission_response(data, buf),
                ResponseKind::DeviceConfig => device_config(data, buf),
            }
        });

        match &result {
            Ok(bytes) => debug!(kind = kind.name(), frame_len = bytes.len(), "Built response"),
            Err(e) => warn!(kind = kind.name(), error = %e, "Failed to build response"),
        }

        result
    }

    /// Build a response from its kind name
    pub fn build_named(&self, kind: &str, data: &BusinessData) -> Result<Bytes, BuildError> {
        self.build(kind.parse()?, data)
    }
}

fn ack(data: &BusinessData, buf: &mut BytesMut) -> Result<(), BuildError> {
    buf.put_u32_le(uint(data, KEY_SEQUENCE, Some(0), u32::MAX as u64)? as u32);
    buf.put_u8(uint(data, "code", Some(0), u8::MAX as u64)? as u8);
    Ok(())
}

fn nak(data: &BusinessData, buf: &mut BytesMut) -> Result<(), BuildError> {
    buf.put_u32_le(uint(data, KEY_SEQUENCE, Some(0), u32::MAX as u64)? as u32);
    buf.put_u16_le(uint(data, "error_code", Some(1), u16::MAX as u64)? as u16);
    put_str_u16(buf, optional_str(data, "reason")?.unwrap_or_default())
}

fn permission_response(data: &BusinessData, buf: &mut BytesMut) -> Result<(), BuildError> {
    buf.put_u32_le(uint(data, "user_id", None, u32::MAX as u64)? as u32);
    buf.put_u8(boolean(data, "granted")? as u8);
    buf.put_u8(access_level(data)?.code());
    buf.put_u64_le(uint(data, "valid_from", Some(0), u64::MAX)?);
    buf.put_u64_le(uint(data, "valid_until", Some(0), u64::MAX)?);
    buf.put_u16_le(uint(
        data,
        "open_duration",
        Some(DEFAULT_OPEN_DURATION_SECS),
        u16::MAX as u64,
    )? as u16);
    Ok(())
}

/// Entries come from a nested `config` object when present, otherwise from
/// every key except the header keys
fn device_config(data: &BusinessData, buf: &mut BytesMut) -> Result<(), BuildError> {
    let entries: Vec<(&String, &Value)> = match data.get("config") {
        Some(Value::Object(config)) => config.iter().collect(),
        Some(_) => return Err(BuildError::encoding("config must be an object")),
        None => data
            .iter()
            .filter(|(k, _)| k.as_str() != KEY_DEVICE_SN && k.as_str() != KEY_SEQUENCE)
            .collect(),
    };

    let count = u16::try_from(entries.len())
        .map_err(|_| BuildError::encoding(format!("{} config entries", entries.len())))?;
    buf.put_u16_le(count);

    for (key, value) in entries {
        put_str_u8(buf, key)?;
        match value {
            Value::String(s) => put_str_u16(buf, s)?,
            other => put_str_u16(buf, &other.to_string())?,
        }
    }
    Ok(())
}

fn uint(data: &BusinessData, key: &str, default: Option<u64>, max: u64) -> Result<u64, BuildError> {
    let value = match data.get(key) {
        None | Some(Value::Null) => {
            return default.ok_or_else(|| BuildError::encoding(format!("missing field {key}")));
        }
        Some(value) => value,
    };

    let n = value
        .as_u64()
        .ok_or_else(|| BuildError::encoding(format!("{key} must be a non-negative integer")))?;

    if n > max {
        return Err(BuildError::encoding(format!("{key}={n} exceeds {max}")));
    }
    Ok(n)
}

fn boolean(data: &BusinessData, key: &str) -> Result<bool, BuildError> {
    data.get(key)
        .ok_or_else(|| BuildError::encoding(format!("missing field {key}")))?
        .as_bool()
        .ok_or_else(|| BuildError::encoding(format!("{key} must be a boolean")))
}

fn optional_str<'a>(data: &'a BusinessData, key: &str) -> Result<Option<&'a str>, BuildError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(BuildError::encoding(format!("{key} must be a string"))),
    }
}

/// Access level given by name or code
fn access_level(data: &BusinessData) -> Result<AccessLevel, BuildError> {
    match data.get("access_level") {
        None | Some(Value::Null) => Ok(AccessLevel::Normal),
        Some(Value::String(name)) => AccessLevel::from_name(name)
            .ok_or_else(|| BuildError::encoding(format!("unknown access level {name}"))),
        Some(_) => Ok(AccessLevel::from(
            uint(data, "access_level", None, u8::MAX as u64)? as u8,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldReader;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data(value: Value) -> BusinessData {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    fn builder() -> ResponseBuilder {
        ResponseBuilder::new(FrameCodec::default())
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!("ack".parse::<ResponseKind>().unwrap(), ResponseKind::Ack);
        assert_eq!(
            "PERMISSION_RESPONSE".parse::<ResponseKind>().unwrap(),
            ResponseKind::PermissionResponse
        );
        assert_eq!(
            "REBOOT".parse::<ResponseKind>(),
            Err(BuildError::UnknownResponseKind("REBOOT".into()))
        );
    }

    #[test]
    fn test_ack_frame() {
        let payload = data(json!({ "device_sn": "F18-01", "sequence": 12 }));
        let bytes = builder().build_at(ResponseKind::Ack, &payload, now()).unwrap();

        let codec = FrameCodec::default();
        let frame = codec.parse(&bytes).unwrap();
        assert!(codec.verify(&frame));
        assert_eq!(frame.header.device_sn, "F18-01");
        assert_eq!(frame.header.message_type, 0x00);
        assert_eq!(frame.header.command, 0x01);
        assert_eq!(frame.header.sequence, 12);
        assert_eq!(frame.header.timestamp_ms, 1_700_000_000_000);
        assert_eq!(frame.payload.as_ref(), &[0x01, 12, 0, 0, 0, 0]);
    }

    #[test]
    fn test_nak_reason() {
        let payload = data(json!({ "error_code": 7, "reason": "bad crc" }));
        let bytes = builder().build_at(ResponseKind::Nak, &payload, now()).unwrap();
        let frame = FrameCodec::default().parse(&bytes).unwrap();

        let mut r = FieldReader::new(&frame.payload);
        assert_eq!(r.u8().unwrap(), 0x02);
        assert_eq!(r.u32().unwrap(), 0);
        assert_eq!(r.u16().unwrap(), 7);
        let len = r.u16().unwrap() as usize;
        assert_eq!(r.take(len).unwrap(), b"bad crc");
    }

    #[test]
    fn test_permission_response_fields() {
        let payload = data(json!({
            "user_id": 4321,
            "granted": true,
            "access_level": "ADMIN",
            "valid_until": 1_800_000_000u64,
        }));
        let bytes = builder()
            .build_at(ResponseKind::PermissionResponse, &payload, now())
            .unwrap();
        let frame = FrameCodec::default().parse(&bytes).unwrap();

        let mut r = FieldReader::new(&frame.payload);
        assert_eq!(r.u8().unwrap(), 0x03);
        assert_eq!(r.u32().unwrap(), 4321);
        assert!(r.flag().unwrap());
        assert_eq!(r.u8().unwrap(), AccessLevel::Admin.code());
        assert_eq!(r.u64().unwrap(), 0);
        assert_eq!(r.u64().unwrap(), 1_800_000_000);
        assert_eq!(r.u16().unwrap(), 5);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_permission_response_requires_user() {
        let payload = data(json!({ "granted": false }));
        let result = builder().build(ResponseKind::PermissionResponse, &payload);
        assert_eq!(
            result,
            Err(BuildError::EncodingFailure("missing field user_id".into()))
        );
    }

    #[test]
    fn test_out_of_range_field_fails() {
        let payload = data(json!({ "code": 300 }));
        assert!(matches!(
            builder().build(ResponseKind::Ack, &payload),
            Err(BuildError::EncodingFailure(_))
        ));

        let payload = data(json!({ "sequence": -1 }));
        assert!(matches!(
            builder().build(ResponseKind::Ack, &payload),
            Err(BuildError::EncodingFailure(_))
        ));
    }

    #[test]
    fn test_device_config_entries() {
        let payload = data(json!({
            "sequence": 3,
            "config": { "volume": 6, "language": "en" },
        }));
        let bytes = builder()
            .build_at(ResponseKind::DeviceConfig, &payload, now())
            .unwrap();
        let frame = FrameCodec::default().parse(&bytes).unwrap();

        let mut r = FieldReader::new(&frame.payload);
        assert_eq!(r.u8().unwrap(), 0x04);
        assert_eq!(r.u16().unwrap(), 2);

        let mut entries = Vec::new();
        for _ in 0..2 {
            let key_len = r.u8().unwrap() as usize;
            let key = String::from_utf8(r.take(key_len).unwrap().to_vec()).unwrap();
            let value_len = r.u16().unwrap() as usize;
            let value = String::from_utf8(r.take(value_len).unwrap().to_vec()).unwrap();
            entries.push((key, value));
        }
        entries.sort();
        assert_eq!(
            entries,
            vec![
                ("language".to_string(), "en".to_string()),
                ("volume".to_string(), "6".to_string()),
            ]
        );
    }

    #[test]
    fn test_device_config_key_too_long() {
        let mut payload = BusinessData::new();
        payload.insert("k".repeat(300), json!(1));

        assert!(matches!(
            builder().build(ResponseKind::DeviceConfig, &payload),
            Err(BuildError::EncodingFailure(_))
        ));
    }

    #[test]
    fn test_build_named_unknown_kind() {
        let result = builder().build_named("REBOOT", &BusinessData::new());
        assert!(matches!(result, Err(BuildError::UnknownResponseKind(_))));
    }
}
