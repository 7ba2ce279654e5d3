//! Dispatch errors

use gatelink_types::ProcessResult;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while assembling a dispatcher
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("No tokio runtime available to run business handlers")]
    NoRuntime,

    #[error("Handler already registered for business type: {0}")]
    DuplicateHandler(String),

    #[error("Dispatcher needs at least one in-flight slot")]
    ZeroConcurrency,
}

/// Failure reported by a business handler
///
/// Never escapes dispatch; it is folded into a failed [`ProcessResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BusinessError {
    /// Error code reported to the caller, `BUSINESS_PROCESS_FAILED` when absent
    pub code: Option<String>,
    pub message: String,
}

impl BusinessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        self.code
            .as_deref()
            .unwrap_or(ProcessResult::BUSINESS_PROCESS_FAILED)
    }
}

impl From<BusinessError> for ProcessResult {
    fn from(err: BusinessError) -> Self {
        let code = err.code().to_string();
        ProcessResult::failure(code, err.message)
    }
}

impl From<serde_json::Error> for BusinessError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Invalid business data: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_code() {
        let result: ProcessResult = BusinessError::new("door controller busy").into();
        assert!(!result.success);
        assert_eq!(result.error_code(), Some("BUSINESS_PROCESS_FAILED"));
        assert_eq!(result.error_message.as_deref(), Some("door controller busy"));
    }

    #[test]
    fn test_explicit_code() {
        let result: ProcessResult = BusinessError::with_code("EVENT_PROCESS_FAILED", "bad event").into();
        assert_eq!(result.error_code(), Some("EVENT_PROCESS_FAILED"));
    }
}
