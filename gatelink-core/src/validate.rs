//! Message validation and device permission checks

use std::sync::Arc;

use tracing::{debug, trace, warn};

use gatelink_types::{
    DeviceRecord, Message, MessageType, PermissionResult, ValidationCode, ValidationResult,
};

use crate::{
    checksum::{Crc32, SharedChecksum},
    constants::DEFAULT_MAX_CLOCK_SKEW_MS,
    error::LookupError,
};

/// Device registry consulted by permission checks
#[cfg_attr(test, mockall::automock)]
pub trait DeviceLookup: Send + Sync {
    /// Find a device by id, `Ok(None)` when it is not registered
    fn find_device(&self, device_id: i64) -> Result<Option<DeviceRecord>, LookupError>;
}

/// Fail-fast message validator
///
/// Checks run in a fixed order and the first failure wins:
/// serial, message type, model, timestamp skew, checksum.
#[derive(Clone)]
pub struct Validator {
    supported_models: Vec<String>,
    checksum: SharedChecksum,
    max_clock_skew_ms: i64,
    lookup: Option<Arc<dyn DeviceLookup>>,
}

impl Validator {
    pub fn new<I, S>(supported_models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported_models: supported_models.into_iter().map(Into::into).collect(),
            checksum: Arc::new(Crc32),
            max_clock_skew_ms: DEFAULT_MAX_CLOCK_SKEW_MS,
            lookup: None,
        }
    }

    /// Set the checksum algorithm used to verify trailers
    pub fn with_checksum(mut self, checksum: SharedChecksum) -> Self {
        self.checksum = checksum;
        self
    }

    /// Set the tolerated device clock skew, in milliseconds
    pub fn with_max_clock_skew_ms(mut self, skew_ms: i64) -> Self {
        self.max_clock_skew_ms = skew_ms.max(0);
        self
    }

    /// Set the device registry used by permission checks
    pub fn with_lookup(mut self, lookup: Arc<dyn DeviceLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn max_clock_skew_ms(&self) -> i64 {
        self.max_clock_skew_ms
    }

    /// Check if a model is supported (case-insensitive)
    pub fn supports_model(&self, model: &str) -> bool {
        self.supported_models
            .iter()
            .any(|m| m.eq_ignore_ascii_case(model))
    }

    /// Validate a decoded message
    pub fn validate(&self, message: Option<&Message>) -> ValidationResult {
        let result = self.check(message);

        match (&result.error_code, message) {
            (Some(code), Some(message)) => warn!(
                device_sn = %message.envelope.device_sn,
                code = code.as_str(),
                "Message failed validation"
            ),
            (Some(code), None) => warn!(code = code.as_str(), "Message failed validation"),
            (None, _) => trace!("Message validated"),
        }

        result
    }

    fn check(&self, message: Option<&Message>) -> ValidationResult {
        let Some(message) = message else {
            return ValidationResult::fail(ValidationCode::MsgNull, "message is absent");
        };
        let envelope = &message.envelope;

        if envelope.device_sn.trim().is_empty() {
            return ValidationResult::fail(ValidationCode::DeviceSnEmpty, "device serial is empty");
        }

        if !MessageType::is_known_code(envelope.message_type) {
            return ValidationResult::fail(
                ValidationCode::MsgTypeInvalid,
                format!("message type 0x{:02X} is not supported", envelope.message_type),
            );
        }

        if let Some(model) = envelope.device_model.as_deref() {
            if !self.supports_model(model) {
                return ValidationResult::fail(
                    ValidationCode::DeviceModelUnsupported,
                    format!("device model {model} is not supported"),
                );
            }
        }

        let received_ms = envelope.received_at.timestamp_millis();
        let skew = received_ms.abs_diff(envelope.timestamp_ms);
        if skew > self.max_clock_skew_ms.unsigned_abs() {
            return ValidationResult::fail(
                ValidationCode::TimestampOutOfRange,
                format!(
                    "device clock differs by {skew} ms, limit is {} ms",
                    self.max_clock_skew_ms
                ),
            );
        }

        if let Some(expected) = envelope.checksum {
            if message.frame.is_empty() {
                return ValidationResult::fail(
                    ValidationCode::ChecksumInvalid,
                    "no frame bytes to verify the checksum against",
                );
            }

            let actual = self.checksum.compute(&message.frame);
            if actual != expected {
                return ValidationResult::fail(
                    ValidationCode::ChecksumInvalid,
                    format!(
                        "{} mismatch: frame carries 0x{expected:08X}, computed 0x{actual:08X}",
                        self.checksum.name()
                    ),
                );
            }
        }

        ValidationResult::ok()
    }

    /// Check if a device may perform `operation`
    pub fn validate_device_permission(&self, device_id: i64, operation: &str) -> PermissionResult {
        let Some(lookup) = self.lookup.as_ref() else {
            return PermissionResult::denied("no device lookup configured");
        };

        let device = match lookup.find_device(device_id) {
            Ok(Some(device)) => device,
            Ok(None) => return PermissionResult::denied(format!("device {device_id} not found")),
            Err(e) => {
                warn!(device_id, error = %e, "Device lookup failed");
                return PermissionResult::denied(e.to_string());
            }
        };

        let result = if !device.online {
            PermissionResult::denied(format!("{device} is offline"))
        } else if !device.enabled {
            PermissionResult::denied(format!("{device} is disabled"))
        } else if !device.permits(operation) {
            PermissionResult::denied(format!("{device} may not perform {operation}"))
        } else {
            PermissionResult::granted(format!("{device} may perform {operation}"))
        };

        debug!(
            device_id,
            operation,
            granted = result.has_permission,
            "Checked device permission"
        );

        result
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("supported_models", &self.supported_models)
            .field("checksum", &self.checksum.name())
            .field("max_clock_skew_ms", &self.max_clock_skew_ms)
            .field("lookup", &self.lookup.is_some())
            .finish()
    }
}
