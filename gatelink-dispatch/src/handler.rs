//! Business handler trait and closure adapter

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use gatelink_types::{BusinessData, ProcessResult};

use crate::error::BusinessError;

/// Processes one business type, e.g. `REAL_TIME_EVENT` or `DOOR_CONTROL`
#[async_trait]
pub trait BusinessHandler: Send + Sync {
    /// Business type this handler is registered under
    fn business_type(&self) -> &str;

    /// Handle data sent by `device_id`
    async fn handle(
        &self,
        data: BusinessData,
        device_id: i64,
    ) -> Result<ProcessResult, BusinessError>;
}

/// Handler backed by an async closure
pub struct FnHandler<F> {
    business_type: String,
    handler: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("business_type", &self.business_type)
            .finish_non_exhaustive()
    }
}

/// Wrap an async closure as a [`BusinessHandler`]
///
/// ```ignore
/// let handler = handler_fn("DOOR_CONTROL", |data, device_id| async move {
///     Ok(ProcessResult::ok(format!("door opened on {device_id}")))
/// });
/// ```
pub fn handler_fn<F, Fut>(business_type: impl Into<String>, handler: F) -> FnHandler<F>
where
    F: Fn(BusinessData, i64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ProcessResult, BusinessError>> + Send + 'static,
{
    FnHandler {
        business_type: business_type.into(),
        handler,
    }
}

#[async_trait]
impl<F, Fut> BusinessHandler for FnHandler<F>
where
    F: Fn(BusinessData, i64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ProcessResult, BusinessError>> + Send + 'static,
{
    fn business_type(&self) -> &str {
        &self.business_type
    }

    async fn handle(
        &self,
        data: BusinessData,
        device_id: i64,
    ) -> Result<ProcessResult, BusinessError> {
        (self.handler)(data, device_id).await
    }
}
