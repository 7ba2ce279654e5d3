//! Payload decoders, one per message type
//!
//! Each decoder consumes fixed-width little-endian fields in protocol order.
//! Enumeration bytes resolve through the code tables in
//! [`gatelink_types::codes`] and never fail. An unknown message-type code is
//! not an error either: the payload decodes to [`Payload::Empty`] and a
//! warning is logged, so newer firmware keeps working.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use gatelink_types::{
    DeviceStatus, Envelope, ErrorReport, Heartbeat, Message, MessageType, Payload,
    PermissionRequest, ProcessStatus, RealTimeEvent, VerifyResult,
};

use crate::{
    constants::{CARD_NUMBER_LEN, SESSION_ID_LEN},
    error::FrameError,
    field::FieldReader,
    frame::RawFrame,
};

/// Decode the payload carried under `message_type`
pub fn decode_payload(message_type: u8, payload: &[u8]) -> Result<Payload, FrameError> {
    let Ok(kind) = MessageType::try_from(message_type) else {
        warn!(
            message_type = format!("0x{:02X}", message_type),
            payload_len = payload.len(),
            "Unknown message type, decoding envelope only"
        );
        return Ok(Payload::Empty);
    };

    let mut reader = FieldReader::new(payload);

    let decoded = match kind {
        MessageType::RealTimeEvent => Payload::RealTimeEvent(real_time_event(&mut reader)?),
        MessageType::DeviceStatus => Payload::DeviceStatus(device_status(&mut reader)?),
        MessageType::Heartbeat => Payload::Heartbeat(heartbeat(&mut reader)?),
        MessageType::PermissionRequest => {
            Payload::PermissionRequest(permission_request(&mut reader)?)
        }
        MessageType::VerifyResult => Payload::VerifyResult(verify_result(&mut reader)?),
        MessageType::ErrorReport => Payload::ErrorReport(error_report(&mut reader)?),
    };

    if reader.remaining() > 0 {
        trace!(
            message_type = kind.name(),
            trailing = reader.remaining(),
            "Ignoring trailing payload bytes"
        );
    }

    Ok(decoded)
}

/// Turn a parsed frame into a message
///
/// `device_id` comes from the transport/session layer and `received_at` is
/// the time the frame was handed over.
pub fn decode_message(
    frame: &RawFrame,
    device_id: i64,
    received_at: DateTime<Utc>,
) -> Result<Message, FrameError> {
    let header = &frame.header;
    let payload = decode_payload(header.message_type, &frame.payload)?;

    let envelope = Envelope {
        device_id,
        device_sn: header.device_sn.clone(),
        device_model: None,
        version: header.version,
        message_type: header.message_type,
        command: header.command,
        sequence: header.sequence,
        timestamp_ms: header.timestamp_ms,
        received_at,
        process_status: ProcessStatus::Received,
        retry_count: 0,
        checksum: Some(frame.checksum),
    };

    let message = Message::new(envelope, payload).with_frame(Bytes::clone(&frame.covered));

    debug!(
        device_id,
        device_sn = %message.envelope.device_sn,
        message_type = message.payload.message_type().map(MessageType::name).unwrap_or("UNKNOWN"),
        "Decoded message"
    );

    Ok(message)
}

fn real_time_event(r: &mut FieldReader<'_>) -> Result<RealTimeEvent, FrameError> {
    let event_type = r.u8()?.into();
    let event_number = r.u64()?;
    let user_id = r.optional_id()?;
    let card_number = Some(r.ascii(CARD_NUMBER_LEN)?).filter(|c| !c.is_empty());
    let verify_method = r.u8()?.into();
    let verify_result = r.u8()?.into();
    let face_confidence = r.confidence()?;
    let liveness_result = r.u8()?.into();
    let liveness_confidence = r.confidence()?;
    let access_point_id = r.optional_id()?;
    let direction = r.u8()?.into();
    let access_time = r.timestamp()?;

    Ok(RealTimeEvent {
        event_type,
        event_number,
        user_id,
        card_number,
        verify_method,
        verify_result,
        face_confidence,
        liveness_result,
        liveness_confidence,
        access_point_id,
        direction,
        access_time,
    })
}

fn device_status(r: &mut FieldReader<'_>) -> Result<DeviceStatus, FrameError> {
    Ok(DeviceStatus {
        device_state: r.u8()?,
        door: r.u8()?.into(),
        lock: r.u8()?.into(),
        online: r.flag()?,
        battery_level: r.u8()?,
        signal_strength: r.u8()?,
        cpu_usage: r.u16()?,
        memory_usage: r.u16()?,
        storage_space: r.u32()?,
        error_code: Some(r.u32()?).filter(|&code| code != 0),
    })
}

fn heartbeat(r: &mut FieldReader<'_>) -> Result<Heartbeat, FrameError> {
    Ok(Heartbeat {
        interval_secs: r.u16()?,
        uptime_secs: r.u32()?,
        connection_status: r.u8()?,
        temperature: r.i16()?,
        humidity: r.i16()?,
    })
}

fn permission_request(r: &mut FieldReader<'_>) -> Result<PermissionRequest, FrameError> {
    Ok(PermissionRequest {
        user_id: r.u32()?,
        access_level: r.u8()?.into(),
        permission_group_id: r.u32()?,
        valid_from: r.timestamp()?,
        valid_until: r.timestamp()?,
        multi_factor_required: r.flag()?,
        anti_passback_enabled: r.flag()?,
    })
}

fn verify_result(r: &mut FieldReader<'_>) -> Result<VerifyResult, FrameError> {
    Ok(VerifyResult {
        result: r.u8()?.into(),
        match_score: r.i16()?,
        failure_reason: r.u8()?,
        process_time_ms: r.u32()?,
        session_id: r.ascii(SESSION_ID_LEN)?,
    })
}

fn error_report(r: &mut FieldReader<'_>) -> Result<ErrorReport, FrameError> {
    let error_code = r.u32()?;
    let level = r.u8()?.into();
    let len = r.u16()? as usize;
    let description = if len > 0 {
        let text = String::from_utf8_lossy(r.take(len)?).trim().to_string();
        Some(text).filter(|t| !t.is_empty())
    } else {
        None
    };

    Ok(ErrorReport {
        error_code,
        level,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use gatelink_types::{AlarmLevel, EventType, VerifyMethod, VerifyOutcome};
    use pretty_assertions::assert_eq;

    /// Face event as laid out on the wire
    fn face_event_payload() -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u8(0x02); // event type: face
        buf.put_u64_le(1001); // event number
        buf.put_i32_le(88); // user id
        buf.put_slice(b"CARD-0001           "); // card number, 20 bytes
        buf.put_u8(0x02); // verify method: face
        buf.put_u8(0x00); // verify result: success
        buf.put_i16_le(9500); // face confidence
        buf.put_u8(0x01); // liveness: real
        buf.put_i16_le(9812); // liveness confidence
        buf.put_i32_le(0); // access point: absent
        buf.put_u8(0x01); // direction: in
        buf.put_u64_le(1_700_000_000); // access time
        buf
    }

    #[test]
    fn test_real_time_face_event() {
        let payload = decode_payload(0x01, &face_event_payload()).unwrap();

        let Payload::RealTimeEvent(event) = payload else {
            panic!("Expected RealTimeEvent");
        };
        assert_eq!(event.event_type, EventType::Face);
        assert_eq!(event.event_number, 1001);
        assert_eq!(event.user_id, Some(88));
        assert_eq!(event.card_number.as_deref(), Some("CARD-0001"));
        assert_eq!(event.verify_method, VerifyMethod::Face);
        assert_eq!(event.verify_result.name(), "SUCCESS");
        assert_eq!(event.face_confidence, 95.0);
        assert_eq!(event.liveness_result.name(), "REAL");
        assert_eq!(event.liveness_confidence, 98.12);
        assert_eq!(event.access_point_id, None);
        assert_eq!(event.direction.name(), "IN");
        assert_eq!(event.access_time.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_unknown_enum_bytes_degrade() {
        let mut payload = face_event_payload();
        payload[0] = 0x7E; // event type
        payload[33] = 0x09; // verify method
        payload[34] = 0x44; // verify result

        let Payload::RealTimeEvent(event) = decode_payload(0x01, &payload).unwrap() else {
            panic!("Expected RealTimeEvent");
        };
        assert_eq!(event.event_type.name(), "UNKNOWN");
        assert_eq!(event.verify_method.name(), "UNKNOWN");
        assert_eq!(event.verify_result, VerifyOutcome::Unknown(0x44));
    }

    #[test]
    fn test_empty_card_is_absent() {
        let mut payload = face_event_payload();
        payload[13..33].fill(0);

        let Payload::RealTimeEvent(event) = decode_payload(0x01, &payload).unwrap() else {
            panic!("Expected RealTimeEvent");
        };
        assert_eq!(event.card_number, None);
    }

    #[test]
    fn test_unknown_message_type_is_empty() {
        let payload = decode_payload(0x09, &[1, 2, 3]).unwrap();
        assert_eq!(payload, Payload::Empty);
    }

    #[test]
    fn test_short_payload_is_truncated() {
        let payload = face_event_payload();
        let result = decode_payload(0x01, &payload[..10]);
        assert!(matches!(result, Err(FrameError::Truncated { .. })));
    }

    #[test]
    fn test_device_status() {
        let mut buf = BytesMut::new();
        buf.put_slice(&[0x00, 0x01, 0x03, 0x01, 87, 4]);
        buf.put_u16_le(35);
        buf.put_u16_le(60);
        buf.put_u32_le(4096);
        buf.put_u32_le(0);

        let Payload::DeviceStatus(status) = decode_payload(0x02, &buf).unwrap() else {
            panic!("Expected DeviceStatus");
        };
        assert_eq!(status.door.name(), "OPEN");
        assert_eq!(status.lock.name(), "FAULT");
        assert!(status.online);
        assert_eq!(status.battery_level, 87);
        assert_eq!(status.storage_space, 4096);
        assert_eq!(status.error_code, None);
    }

    #[test]
    fn test_heartbeat_fields() {
        let mut buf = BytesMut::new();
        buf.put_u16_le(30); // interval
        buf.put_u32_le(86_400); // uptime
        buf.put_u8(0x01); // connection status
        buf.put_i16_le(-15); // temperature
        buf.put_i16_le(55); // humidity

        let Payload::Heartbeat(heartbeat) = decode_payload(0x03, &buf).unwrap() else {
            panic!("Expected Heartbeat");
        };
        assert_eq!(heartbeat.interval_secs, 30);
        assert_eq!(heartbeat.uptime_secs, 86_400);
        assert_eq!(heartbeat.connection_status, 1);
        assert_eq!(heartbeat.temperature, -15);
        assert_eq!(heartbeat.humidity, 55);
    }

    #[test]
    fn test_error_report_description() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(0x0103);
        buf.put_u8(0x04);
        buf.put_u16_le(11);
        buf.put_slice(b"door forced");

        let Payload::ErrorReport(report) = decode_payload(0x06, &buf).unwrap() else {
            panic!("Expected ErrorReport");
        };
        assert_eq!(report.error_code, 0x0103);
        assert_eq!(report.level, AlarmLevel::Critical);
        assert_eq!(report.description.as_deref(), Some("door forced"));
    }

    #[test]
    fn test_error_report_description_overruns() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(1);
        buf.put_u8(0x01);
        buf.put_u16_le(50);
        buf.put_slice(b"short");

        assert!(matches!(
            decode_payload(0x06, &buf),
            Err(FrameError::Truncated { .. })
        ));
    }

    #[test]
    fn test_verify_result_session() {
        let mut buf = BytesMut::new();
        buf.put_u8(0x01);
        buf.put_i16_le(412);
        buf.put_u8(0x03);
        buf.put_u32_le(180);
        buf.put_slice(b"S-77\0\0\0\0\0\0\0\0\0\0\0\0");

        let Payload::VerifyResult(result) = decode_payload(0x05, &buf).unwrap() else {
            panic!("Expected VerifyResult");
        };
        assert_eq!(result.result.name(), "FAILED");
        assert_eq!(result.match_score, 412);
        assert_eq!(result.session_id, "S-77");
    }
}
