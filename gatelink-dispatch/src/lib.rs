//! Business dispatch for decoded terminal messages
//!
//! Handlers are registered per business type before the dispatcher is
//! built. Each dispatched call runs as its own task on a tokio runtime and
//! resolves to a [`ProcessResult`]; handler failures and panics never escape
//! as errors.

pub mod dispatcher;
pub mod error;
pub mod future;
pub mod handler;

pub use dispatcher::{Dispatcher, DispatcherBuilder, DEFAULT_MAX_IN_FLIGHT};
pub use error::{BusinessError, Error, Result};
pub use future::DispatchFuture;
pub use handler::{handler_fn, BusinessHandler, FnHandler};

pub use gatelink_types::{BusinessData, ProcessResult};
