//! Outcome shapes returned by validation, permission checks and dispatch

use std::fmt;

use serde::Serialize;

use crate::BusinessData;

/// Failure codes reported by message validation, in check order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    MsgNull,
    DeviceSnEmpty,
    MsgTypeInvalid,
    DeviceModelUnsupported,
    TimestampOutOfRange,
    ChecksumInvalid,
}

impl ValidationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MsgNull => "MSG_NULL",
            Self::DeviceSnEmpty => "DEVICE_SN_EMPTY",
            Self::MsgTypeInvalid => "MSG_TYPE_INVALID",
            Self::DeviceModelUnsupported => "DEVICE_MODEL_UNSUPPORTED",
            Self::TimestampOutOfRange => "TIMESTAMP_OUT_OF_RANGE",
            Self::ChecksumInvalid => "CHECKSUM_INVALID",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of message validation
///
/// Validation is fail-fast: at most one error is ever reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error_code: Option<ValidationCode>,
    pub error_message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error_code: None,
            error_message: None,
        }
    }

    pub fn fail(code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_code: Some(code),
            error_message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Verdict of a device permission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionResult {
    pub has_permission: bool,
    pub error_code: Option<&'static str>,
    pub error_message: Option<String>,
    pub details: Option<String>,
}

impl PermissionResult {
    /// Error code for every failed permission check
    pub const CHECK_FAILED: &'static str = "PERMISSION_CHECK_FAILED";

    pub fn granted(details: impl Into<String>) -> Self {
        Self {
            has_permission: true,
            error_code: None,
            error_message: None,
            details: Some(details.into()),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            has_permission: false,
            error_code: Some(Self::CHECK_FAILED),
            error_message: Some(reason.into()),
            details: None,
        }
    }
}

/// Observable outcome of business dispatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    pub message: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub data: Option<BusinessData>,
}

impl ProcessResult {
    /// Domain not served by the adapter
    pub const NOT_SUPPORTED: &'static str = "NOT_SUPPORTED";

    /// No handler registered for the business type
    pub const UNKNOWN_BUSINESS_TYPE: &'static str = "UNKNOWN_BUSINESS_TYPE";

    /// Handler failed without naming its own code
    pub const BUSINESS_PROCESS_FAILED: &'static str = "BUSINESS_PROCESS_FAILED";

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error_code: None,
            error_message: None,
            data: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error_code: Some(code.into()),
            error_message: Some(message.into()),
            data: None,
        }
    }

    pub fn not_supported(domain: &str) -> Self {
        Self::failure(
            Self::NOT_SUPPORTED,
            format!("{domain} business is not supported by this protocol"),
        )
    }

    pub fn unknown_business_type(business_type: &str) -> Self {
        Self::failure(
            Self::UNKNOWN_BUSINESS_TYPE,
            format!("Unknown business type: {business_type}"),
        )
    }

    /// Attach result data for the caller
    pub fn with_data(mut self, data: BusinessData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }
}
