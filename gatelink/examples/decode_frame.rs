//! Decode a device frame, validate it, dispatch it and answer with an ACK
//!
//! Pass a frame as hex in `FRAME_HEX`, or run without it to use a simulated
//! face-recognition event. Set `RUST_LOG=debug` to follow each step.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use gatelink::{
    handler_fn, AdapterConfig, BusinessData, EntropyV48Adapter, ProcessResult, ProtocolAdapter,
};
use gatelink_core::{encode_message, hex::encode_hex};
use gatelink_types::{
    AccessDirection, Envelope, EventType, LivenessResult, Message, Payload, RealTimeEvent,
    VerifyMethod, VerifyOutcome,
};

fn simulated_frame(adapter: &EntropyV48Adapter) -> anyhow::Result<String> {
    let mut envelope = Envelope::new(1, "SC700-000042", 0x01);
    envelope.version = 0x0480;
    envelope.sequence = 1;
    envelope.timestamp_ms = Utc::now().timestamp_millis();

    let event = RealTimeEvent {
        event_type: EventType::Face,
        event_number: 1,
        user_id: Some(1024),
        card_number: None,
        verify_method: VerifyMethod::Face,
        verify_result: VerifyOutcome::Success,
        face_confidence: 96.4,
        liveness_result: LivenessResult::Real,
        liveness_confidence: 99.1,
        access_point_id: Some(1),
        direction: AccessDirection::In,
        access_time: Some(Utc::now()),
    };

    let bytes = encode_message(adapter.codec(), &Message::new(envelope, Payload::RealTimeEvent(event)))?;
    Ok(encode_hex(&bytes))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AdapterConfig::from_env().context("reading GATELINK_* settings")?;
    let dispatcher = config
        .dispatcher_builder()
        .register(handler_fn("REAL_TIME_EVENT", |data: BusinessData, device_id| async move {
            let event = &data["payload"]["data"];
            println!(
                "device {device_id}: user {} {} by {}",
                event["user_id"], event["verify_result"], event["verify_method"]
            );
            Ok(ProcessResult::ok("event recorded"))
        }))
        .build()?;

    let adapter = Arc::new(EntropyV48Adapter::with_config(config).with_dispatcher(dispatcher));
    adapter.initialize()?;

    let hex = match std::env::var("FRAME_HEX") {
        Ok(hex) => hex,
        Err(_) => simulated_frame(&adapter)?,
    };
    println!("frame: {hex}");

    let message = adapter.parse_hex(&hex, 1).context("decoding frame")?;
    println!("decoded: {message}");

    let verdict = adapter.validate(Some(&message));
    if !verdict.valid {
        let reply = adapter.build_hex(
            "NAK",
            &object(json!({
                "device_sn": message.envelope.device_sn,
                "sequence": message.envelope.sequence,
                "reason": verdict.error_message.unwrap_or_default(),
            })),
            message.envelope.device_id,
        )?;
        println!("rejected, reply: {reply}");
        return Ok(());
    }

    let result = adapter.dispatch_message(&message).await;
    println!("dispatch: {}", serde_json::to_string_pretty(&result)?);

    let reply = adapter.build_hex(
        "ACK",
        &object(json!({
            "device_sn": message.envelope.device_sn,
            "sequence": message.envelope.sequence,
            "code": if result.success { 0 } else { 1 },
        })),
        message.envelope.device_id,
    )?;
    println!("reply: {reply}");

    adapter.destroy();
    Ok(())
}

fn object(value: serde_json::Value) -> BusinessData {
    match value {
        serde_json::Value::Object(map) => map,
        _ => BusinessData::new(),
    }
}
