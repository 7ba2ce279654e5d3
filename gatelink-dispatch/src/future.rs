//! Future returned by dispatch

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;
use tracing::error;

use gatelink_types::ProcessResult;

/// Outcome of one dispatched call
///
/// Resolves to a [`ProcessResult`] and never to an error: a panicking or
/// cancelled handler task yields `BUSINESS_PROCESS_FAILED`. Dropping the
/// future detaches the task, it keeps running.
#[derive(Debug)]
pub enum DispatchFuture {
    /// Handler running on the runtime
    Spawned(JoinHandle<ProcessResult>),

    /// Result known without running a handler
    Ready(Option<ProcessResult>),
}

impl DispatchFuture {
    /// Future that resolves immediately to `result`
    pub fn ready(result: ProcessResult) -> Self {
        Self::Ready(Some(result))
    }
}

impl Future for DispatchFuture {
    type Output = ProcessResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.get_mut() {
            Self::Spawned(handle) => Pin::new(handle).poll(cx).map(|joined| match joined {
                Ok(result) => result,
                Err(e) => {
                    let reason = if e.is_panic() {
                        "business handler panicked"
                    } else {
                        "business handler was cancelled"
                    };
                    error!(error = %e, "{}", reason);
                    ProcessResult::failure(ProcessResult::BUSINESS_PROCESS_FAILED, reason)
                }
            }),
            Self::Ready(result) => Poll::Ready(result.take().unwrap_or_else(|| {
                ProcessResult::failure(
                    ProcessResult::BUSINESS_PROCESS_FAILED,
                    "dispatch result already taken",
                )
            })),
        }
    }
}
