//! Device records resolved by an external device lookup

use std::fmt;

/// Device as known to the caller's registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Registry identifier
    pub device_id: i64,

    /// Device serial number
    pub serial_number: String,

    /// Device model
    pub model: Option<String>,

    /// Whether the device currently holds a session
    pub online: bool,

    /// Whether the device is enabled by an operator
    pub enabled: bool,

    /// Operations the device may perform
    pub permitted_operations: Vec<String>,
}

impl DeviceRecord {
    /// Create an online, enabled device with no permitted operations
    pub fn new(device_id: i64, serial_number: impl Into<String>) -> Self {
        Self {
            device_id,
            serial_number: serial_number.into(),
            model: None,
            online: true,
            enabled: true,
            permitted_operations: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permitted_operations = operations.into_iter().map(Into::into).collect();
        self
    }

    /// Check if an operation is allowed (case-insensitive)
    pub fn permits(&self, operation: &str) -> bool {
        self.permitted_operations
            .iter()
            .any(|op| op.eq_ignore_ascii_case(operation))
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[ID: {}, SN: {}, Model: {}]",
            self.device_id,
            self.serial_number,
            self.model.as_deref().unwrap_or("-")
        )
    }
}
