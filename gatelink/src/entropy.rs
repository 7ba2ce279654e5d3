//! ZKTeco Entropy V4.8 access-control adapter

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use gatelink_core::{
    decode_message, DeviceLookup, FrameCodec, FrameLayout, ResponseBuilder, ResponseKind, Validator,
};
use gatelink_dispatch::{DispatchFuture, Dispatcher};
use gatelink_types::{BusinessData, Message, PermissionResult, ProcessResult, ValidationResult};

use crate::{
    adapter::ProtocolAdapter,
    config::AdapterConfig,
    error::Result,
    lifecycle::{AdapterState, Lifecycle},
};

/// Entropy V4.8 push protocol over access-control terminals
///
/// Serves the access domain only. Business handlers (`REAL_TIME_EVENT`,
/// `ACCESS_VERIFY`, `DOOR_CONTROL`, `ALARM_EVENT`, ...) are supplied by the
/// caller through a [`Dispatcher`]; attendance and consume calls resolve to
/// `NOT_SUPPORTED`.
///
/// # Examples
///
/// ```no_run
/// use gatelink::{EntropyV48Adapter, ProtocolAdapter};
///
/// # fn main() -> gatelink::Result<()> {
/// let adapter = EntropyV48Adapter::new();
/// adapter.initialize()?;
///
/// let message = adapter.parse_hex("4548 ...", 1)?;
/// let verdict = adapter.validate(Some(&message));
/// println!("{message}: valid={}", verdict.valid);
/// # Ok(())
/// # }
/// ```
pub struct EntropyV48Adapter {
    codec: FrameCodec,
    responses: ResponseBuilder,
    validator: Validator,
    dispatcher: Option<Dispatcher>,
    supported_models: Vec<String>,
    lifecycle: Lifecycle,
}

impl EntropyV48Adapter {
    pub const PROTOCOL_TYPE: &'static str = "ACCESS_ENTROPY_V4_8";
    pub const MANUFACTURER: &'static str = "ZKTeco (Entropy)";
    pub const VERSION: &'static str = "V4.8";

    pub const SUPPORTED_MODELS: [&'static str; 10] = [
        "MA300", "MA300T", "SC405", "SC700", "SC705", "F18", "TA800C", "TA800T", "WK2600",
        "WK2600P",
    ];

    pub fn new() -> Self {
        Self::with_config(AdapterConfig::default())
    }

    pub fn with_config(config: AdapterConfig) -> Self {
        let codec = FrameCodec::new(FrameLayout::ENTROPY_V48, Arc::clone(config.checksum()));
        let supported_models: Vec<String> =
            Self::SUPPORTED_MODELS.iter().map(|m| m.to_string()).collect();

        let validator = Validator::new(supported_models.iter().cloned())
            .with_checksum(Arc::clone(config.checksum()))
            .with_max_clock_skew_ms(config.max_clock_skew_ms());

        Self {
            responses: ResponseBuilder::new(codec.clone()),
            codec,
            validator,
            dispatcher: None,
            supported_models,
            lifecycle: Lifecycle::new(Self::PROTOCOL_TYPE),
        }
    }

    /// Route access business through `dispatcher`
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Resolve devices through `lookup` for permission checks
    pub fn with_device_lookup(mut self, lookup: Arc<dyn DeviceLookup>) -> Self {
        self.validator = self.validator.with_lookup(lookup);
        self
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }
}

impl Default for EntropyV48Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolAdapter for EntropyV48Adapter {
    fn protocol_type(&self) -> &str {
        Self::PROTOCOL_TYPE
    }

    fn manufacturer(&self) -> &str {
        Self::MANUFACTURER
    }

    fn version(&self) -> &str {
        Self::VERSION
    }

    fn supported_models(&self) -> &[String] {
        &self.supported_models
    }

    fn supports_model(&self, model: &str) -> bool {
        self.validator.supports_model(model)
    }

    fn parse(&self, raw: &[u8], device_id: i64) -> Result<Message> {
        let frame = self.codec.parse(raw)?;
        let message = decode_message(&frame, device_id, Utc::now())?;
        Ok(message)
    }

    fn build(&self, kind: &str, data: &BusinessData, device_id: i64) -> Result<Bytes> {
        let kind: ResponseKind = kind.parse().inspect_err(|e| {
            warn!(device_id, error = %e, "Rejected response kind");
        })?;
        let bytes = self.responses.build(kind, data)?;
        debug!(device_id, kind = %kind, len = bytes.len(), "Built response");
        Ok(bytes)
    }

    fn validate(&self, message: Option<&Message>) -> ValidationResult {
        self.validator.validate(message)
    }

    fn validate_device_permission(&self, device_id: i64, operation: &str) -> PermissionResult {
        self.validator.validate_device_permission(device_id, operation)
    }

    fn process_access(&self, business_type: &str, data: BusinessData, device_id: i64) -> DispatchFuture {
        if !self.lifecycle.is_running() {
            return DispatchFuture::ready(ProcessResult::failure(
                ProcessResult::BUSINESS_PROCESS_FAILED,
                format!("adapter is {}", self.lifecycle.state()),
            ));
        }

        let Some(dispatcher) = self.dispatcher.as_ref() else {
            debug!(business_type, device_id, "No dispatcher configured");
            return DispatchFuture::ready(ProcessResult::unknown_business_type(business_type));
        };

        dispatcher.process(business_type, data, device_id)
    }

    fn initialize(&self) -> Result<()> {
        self.lifecycle.start()?;
        info!(
            manufacturer = Self::MANUFACTURER,
            version = Self::VERSION,
            models = self.supported_models.len(),
            "Entropy adapter ready"
        );
        Ok(())
    }

    fn destroy(&self) {
        self.lifecycle.stop();
    }

    fn status(&self) -> AdapterState {
        self.lifecycle.state()
    }

    fn performance_statistics(&self) -> BusinessData {
        let mut stats = BusinessData::new();
        stats.insert("protocol_type".into(), Self::PROTOCOL_TYPE.into());
        stats.insert("manufacturer".into(), Self::MANUFACTURER.into());
        stats.insert("version".into(), Self::VERSION.into());
        stats.insert(
            "supported_device_count".into(),
            self.supported_models.len().into(),
        );
        stats.insert("status".into(), self.status().name().into());

        if let Some(dispatcher) = self.dispatcher.as_ref() {
            stats.insert(
                "business_types".into(),
                Value::from(dispatcher.business_types()),
            );
            stats.insert("max_in_flight".into(), dispatcher.max_in_flight().into());
            stats.insert(
                "in_flight".into(),
                (dispatcher.max_in_flight() - dispatcher.available_slots()).into(),
            );
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identity() {
        let adapter = EntropyV48Adapter::new();
        assert_eq!(adapter.protocol_type(), "ACCESS_ENTROPY_V4_8");
        assert_eq!(adapter.manufacturer(), "ZKTeco (Entropy)");
        assert_eq!(adapter.version(), "V4.8");
        assert_eq!(adapter.supported_models().len(), 10);
        assert!(adapter.supports_model("wk2600p"));
        assert!(!adapter.supports_model("K40"));
    }

    #[test]
    fn test_statistics() {
        let adapter = EntropyV48Adapter::new();
        adapter.initialize().unwrap();

        let stats = adapter.performance_statistics();
        assert_eq!(stats["protocol_type"], "ACCESS_ENTROPY_V4_8");
        assert_eq!(stats["supported_device_count"], 10);
        assert_eq!(stats["status"], "RUNNING");
        assert!(!stats.contains_key("business_types"));
    }

    #[tokio::test]
    async fn test_unserved_domains() {
        let adapter = EntropyV48Adapter::new();
        adapter.initialize().unwrap();

        let attendance = adapter.process_attendance("CLOCK_IN", BusinessData::new(), 1).await;
        assert_eq!(attendance.error_code(), Some("NOT_SUPPORTED"));

        let consume = adapter.process_consume("PAYMENT", BusinessData::new(), 1).await;
        assert_eq!(consume.error_code(), Some("NOT_SUPPORTED"));
    }

    #[tokio::test]
    async fn test_access_needs_running_adapter() {
        let adapter = EntropyV48Adapter::new();

        let result = adapter.process_access("DOOR_CONTROL", BusinessData::new(), 1).await;
        assert_eq!(result.error_code(), Some("BUSINESS_PROCESS_FAILED"));
        assert_eq!(result.error_message.as_deref(), Some("adapter is CREATED"));

        adapter.initialize().unwrap();
        let result = adapter.process_access("DOOR_CONTROL", BusinessData::new(), 1).await;
        assert_eq!(result.error_code(), Some("UNKNOWN_BUSINESS_TYPE"));
    }

    #[test]
    fn test_build_unknown_kind() {
        let adapter = EntropyV48Adapter::new();
        let err = adapter.build("REBOOT", &BusinessData::new(), 7).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Build(gatelink_core::BuildError::UnknownResponseKind(_))
        ));
    }
}
