//! Payload encoders, the inverse of [`crate::decode`]
//!
//! Used by device simulators and tests to produce inbound frames in the same
//! field layout the decoders consume.

use bytes::{BufMut, Bytes, BytesMut};

use gatelink_types::{
    DeviceStatus, ErrorReport, Heartbeat, Message, Payload, PermissionRequest, RealTimeEvent,
    VerifyResult,
};

use crate::{
    constants::{CARD_NUMBER_LEN, SESSION_ID_LEN},
    error::BuildError,
    field::{confidence_to_raw, datetime_to_secs, put_padded, put_str_u16},
    frame::{FrameCodec, FrameHeader},
};

/// Write a payload in wire layout; [`Payload::Empty`] writes nothing
pub fn encode_payload(payload: &Payload, buf: &mut BytesMut) -> Result<(), BuildError> {
    match payload {
        Payload::RealTimeEvent(event) => real_time_event(event, buf),
        Payload::DeviceStatus(status) => {
            device_status(status, buf);
            Ok(())
        }
        Payload::Heartbeat(heartbeat) => {
            self::heartbeat(heartbeat, buf);
            Ok(())
        }
        Payload::PermissionRequest(request) => {
            permission_request(request, buf);
            Ok(())
        }
        Payload::VerifyResult(result) => verify_result(result, buf),
        Payload::ErrorReport(report) => error_report(report, buf),
        Payload::Empty => Ok(()),
    }
}

/// Encode a whole message into a frame, as a device would send it
pub fn encode_message(codec: &FrameCodec, message: &Message) -> Result<Bytes, BuildError> {
    let envelope = &message.envelope;
    let header = FrameHeader {
        version: envelope.version,
        device_sn: envelope.device_sn.clone(),
        message_type: envelope.message_type,
        command: envelope.command,
        sequence: envelope.sequence,
        timestamp_ms: envelope.timestamp_ms,
    };

    codec.build(&header, |buf| encode_payload(&message.payload, buf))
}

fn real_time_event(event: &RealTimeEvent, buf: &mut BytesMut) -> Result<(), BuildError> {
    buf.put_u8(event.event_type.code());
    buf.put_u64_le(event.event_number);
    buf.put_i32_le(id_to_wire(event.user_id)?);
    put_padded(buf, event.card_number.as_deref().unwrap_or(""), CARD_NUMBER_LEN)?;
    buf.put_u8(event.verify_method.code());
    buf.put_u8(event.verify_result.code());
    buf.put_i16_le(confidence_to_raw(event.face_confidence));
    buf.put_u8(event.liveness_result.code());
    buf.put_i16_le(confidence_to_raw(event.liveness_confidence));
    buf.put_i32_le(id_to_wire(event.access_point_id)?);
    buf.put_u8(event.direction.code());
    buf.put_u64_le(datetime_to_secs(event.access_time));
    Ok(())
}

fn device_status(status: &DeviceStatus, buf: &mut BytesMut) {
    buf.put_u8(status.device_state);
    buf.put_u8(status.door.code());
    buf.put_u8(status.lock.code());
    buf.put_u8(status.online as u8);
    buf.put_u8(status.battery_level);
    buf.put_u8(status.signal_strength);
    buf.put_u16_le(status.cpu_usage);
    buf.put_u16_le(status.memory_usage);
    buf.put_u32_le(status.storage_space);
    buf.put_u32_le(status.error_code.unwrap_or(0));
}

fn heartbeat(heartbeat: &Heartbeat, buf: &mut BytesMut) {
    buf.put_u16_le(heartbeat.interval_secs);
    buf.put_u32_le(heartbeat.uptime_secs);
    buf.put_u8(heartbeat.connection_status);
    buf.put_i16_le(heartbeat.temperature);
    buf.put_i16_le(heartbeat.humidity);
}

fn permission_request(request: &PermissionRequest, buf: &mut BytesMut) {
    buf.put_u32_le(request.user_id);
    buf.put_u8(request.access_level.code());
    buf.put_u32_le(request.permission_group_id);
    buf.put_u64_le(datetime_to_secs(request.valid_from));
    buf.put_u64_le(datetime_to_secs(request.valid_until));
    buf.put_u8(request.multi_factor_required as u8);
    buf.put_u8(request.anti_passback_enabled as u8);
}

fn verify_result(result: &VerifyResult, buf: &mut BytesMut) -> Result<(), BuildError> {
    buf.put_u8(result.result.code());
    buf.put_i16_le(result.match_score);
    buf.put_u8(result.failure_reason);
    buf.put_u32_le(result.process_time_ms);
    put_padded(buf, &result.session_id, SESSION_ID_LEN)
}

fn error_report(report: &ErrorReport, buf: &mut BytesMut) -> Result<(), BuildError> {
    buf.put_u32_le(report.error_code);
    buf.put_u8(report.level.code());
    put_str_u16(buf, report.description.as_deref().map(str::trim).unwrap_or(""))
}

fn id_to_wire(id: Option<u32>) -> Result<i32, BuildError> {
    i32::try_from(id.unwrap_or(0))
        .map_err(|_| BuildError::EncodingFailure(format!("id {id:?} exceeds i32 range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode_message, decode_payload};
    use chrono::{DateTime, Utc};
    use gatelink_types::{
        AccessDirection, AccessLevel, AlarmLevel, DoorStatus, Envelope, EventType,
        LivenessResult, LockStatus, VerifyMethod, VerifyOutcome,
    };
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sample_payloads() -> Vec<Payload> {
        let when = DateTime::from_timestamp(1_700_000_000, 0);
        vec![
            Payload::RealTimeEvent(RealTimeEvent {
                event_type: EventType::Card,
                event_number: 77,
                user_id: Some(12),
                card_number: Some("0012345678".into()),
                verify_method: VerifyMethod::Card,
                verify_result: VerifyOutcome::Failed,
                face_confidence: 0.0,
                liveness_result: LivenessResult::Unknown(0),
                liveness_confidence: 0.0,
                access_point_id: Some(3),
                direction: AccessDirection::Out,
                access_time: when,
            }),
            Payload::DeviceStatus(DeviceStatus {
                device_state: 1,
                door: DoorStatus::Closed,
                lock: LockStatus::Locked,
                online: true,
                battery_level: 100,
                signal_strength: 3,
                cpu_usage: 12,
                memory_usage: 48,
                storage_space: 1 << 20,
                error_code: Some(0x21),
            }),
            Payload::PermissionRequest(PermissionRequest {
                user_id: 9,
                access_level: AccessLevel::Vip,
                permission_group_id: 4,
                valid_from: when,
                valid_until: None,
                multi_factor_required: true,
                anti_passback_enabled: false,
            }),
            Payload::Heartbeat(Heartbeat {
                interval_secs: 30,
                uptime_secs: 86_400,
                connection_status: 1,
                temperature: -15,
                humidity: 55,
            }),
            Payload::VerifyResult(VerifyResult {
                result: VerifyOutcome::Timeout,
                match_score: -3,
                failure_reason: 2,
                process_time_ms: 1_250,
                session_id: "S-0042".into(),
            }),
            Payload::ErrorReport(ErrorReport {
                error_code: 500,
                level: AlarmLevel::High,
                description: Some("reader offline".into()),
            }),
        ]
    }

    fn error_report_with(description: &str) -> Payload {
        Payload::ErrorReport(ErrorReport {
            error_code: 7,
            level: AlarmLevel::Low,
            description: Some(description.into()),
        })
    }

    #[test]
    fn test_error_report_description_trimmed() {
        let mut buf = BytesMut::new();
        encode_payload(&error_report_with("  padded "), &mut buf).unwrap();

        // code, level, then a 6-byte description
        assert_eq!(&buf[5..7], &6u16.to_le_bytes());
        assert_eq!(decode_payload(0x06, &buf).unwrap(), error_report_with("padded"));

        let mut blank = BytesMut::new();
        encode_payload(&error_report_with("   "), &mut blank).unwrap();
        let Payload::ErrorReport(report) = decode_payload(0x06, &blank).unwrap() else {
            panic!("Expected ErrorReport");
        };
        assert_eq!(report.description, None);
    }

    proptest! {
        #[test]
        fn prop_heartbeat_decodes_back(
            interval_secs in any::<u16>(),
            uptime_secs in any::<u32>(),
            connection_status in any::<u8>(),
            temperature in any::<i16>(),
            humidity in any::<i16>(),
        ) {
            let payload = Payload::Heartbeat(Heartbeat {
                interval_secs,
                uptime_secs,
                connection_status,
                temperature,
                humidity,
            });
            let mut buf = BytesMut::new();
            encode_payload(&payload, &mut buf).unwrap();

            prop_assert_eq!(buf.len(), 11);
            prop_assert_eq!(decode_payload(0x03, &buf).unwrap(), payload);
        }
    }

    #[test]
    fn test_payloads_decode_back() {
        for payload in sample_payloads() {
            let message_type = payload.message_type().unwrap().code();
            let mut buf = BytesMut::new();
            encode_payload(&payload, &mut buf).unwrap();

            assert_eq!(decode_payload(message_type, &buf).unwrap(), payload);
        }
    }

    #[test]
    fn test_message_frame_round_trip() {
        let codec = FrameCodec::default();
        let mut envelope = Envelope::new(5, "TA800C-0007", 0x01);
        envelope.version = 0x0480;
        envelope.command = 0x20;
        envelope.sequence = 31;
        envelope.timestamp_ms = 1_700_000_123_000;
        let message = Message::new(envelope, sample_payloads().remove(0));

        let bytes = encode_message(&codec, &message).unwrap();
        let frame = codec.parse(&bytes).unwrap();
        let decoded = decode_message(&frame, 5, Utc::now()).unwrap();

        assert_eq!(decoded.envelope.device_sn, "TA800C-0007");
        assert_eq!(decoded.envelope.command, 0x20);
        assert_eq!(decoded.envelope.sequence, 31);
        assert_eq!(decoded.envelope.timestamp_ms, 1_700_000_123_000);
        assert_eq!(decoded.envelope.checksum, Some(frame.checksum));
        assert_eq!(decoded.payload, message.payload);
        assert_eq!(decoded.frame, frame.covered);
    }

    #[test]
    fn test_oversized_card_number_fails() {
        let Payload::RealTimeEvent(mut event) = sample_payloads().remove(0) else {
            panic!("Expected RealTimeEvent");
        };
        event.card_number = Some("X".repeat(21));

        let mut buf = BytesMut::new();
        let result = encode_payload(&Payload::RealTimeEvent(event), &mut buf);
        assert!(matches!(result, Err(BuildError::EncodingFailure(_))));
    }
}
