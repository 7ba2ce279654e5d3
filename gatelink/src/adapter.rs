//! Protocol adapter contract
//!
//! One adapter per device protocol family. Adapters are shared as
//! `Arc<dyn ProtocolAdapter>` by the registry that selects them per device
//! model, so every method takes `&self` and the trait stays object safe.

use bytes::Bytes;
use tracing::warn;

use gatelink_core::hex::{decode_hex, encode_hex};
use gatelink_dispatch::DispatchFuture;
use gatelink_types::{BusinessData, Message, PermissionResult, ProcessResult, ValidationResult};

use crate::error::Result;
use crate::lifecycle::AdapterState;

/// Contract every device protocol adapter fulfils
pub trait ProtocolAdapter: Send + Sync {
    /// Protocol identifier, e.g. `ACCESS_ENTROPY_V4_8`
    fn protocol_type(&self) -> &str;

    fn manufacturer(&self) -> &str;

    /// Protocol version, e.g. `V4.8`
    fn version(&self) -> &str;

    fn supported_models(&self) -> &[String];

    /// Check if a device model speaks this protocol (case-insensitive)
    fn supports_model(&self, model: &str) -> bool {
        self.supported_models()
            .iter()
            .any(|m| m.eq_ignore_ascii_case(model))
    }

    /// Decode one frame received from `device_id`
    fn parse(&self, raw: &[u8], device_id: i64) -> Result<Message>;

    /// Decode one frame given as hex text
    fn parse_hex(&self, hex: &str, device_id: i64) -> Result<Message> {
        let raw = decode_hex(hex)?;
        self.parse(&raw, device_id)
    }

    /// Build a response frame of the named kind for `device_id`
    fn build(&self, kind: &str, data: &BusinessData, device_id: i64) -> Result<Bytes>;

    /// Build a response frame as upper-case hex text
    fn build_hex(&self, kind: &str, data: &BusinessData, device_id: i64) -> Result<String> {
        self.build(kind, data, device_id).map(|bytes| encode_hex(&bytes))
    }

    /// Fail-fast validation of a decoded message
    fn validate(&self, message: Option<&Message>) -> ValidationResult;

    /// Check if a device may perform `operation`
    fn validate_device_permission(&self, device_id: i64, operation: &str) -> PermissionResult;

    /// Access-control business: events, verification, door control, alarms
    fn process_access(&self, _business_type: &str, _data: BusinessData, _device_id: i64) -> DispatchFuture {
        DispatchFuture::ready(ProcessResult::not_supported("Access"))
    }

    /// Time-attendance business
    fn process_attendance(
        &self,
        _business_type: &str,
        _data: BusinessData,
        _device_id: i64,
    ) -> DispatchFuture {
        DispatchFuture::ready(ProcessResult::not_supported("Attendance"))
    }

    /// Consumption (payment) business
    fn process_consume(&self, _business_type: &str, _data: BusinessData, _device_id: i64) -> DispatchFuture {
        DispatchFuture::ready(ProcessResult::not_supported("Consume"))
    }

    /// Route a decoded message to the access domain by its payload
    fn dispatch_message(&self, message: &Message) -> DispatchFuture {
        let Some(business_type) = message.payload.business_type() else {
            warn!(msg = %message, "Message has no business payload");
            return DispatchFuture::ready(ProcessResult::unknown_business_type(&format!(
                "0x{:02X}",
                message.envelope.message_type
            )));
        };

        match message.to_business_data() {
            Ok(data) => self.process_access(business_type, data, message.envelope.device_id),
            Err(e) => DispatchFuture::ready(ProcessResult::failure(
                ProcessResult::BUSINESS_PROCESS_FAILED,
                e.to_string(),
            )),
        }
    }

    /// Move to Running; fails if already running or destroyed
    fn initialize(&self) -> Result<()>;

    /// Move to Destroyed; idempotent
    fn destroy(&self);

    fn status(&self) -> AdapterState;

    /// Identity and runtime figures for monitoring
    fn performance_statistics(&self) -> BusinessData;
}
