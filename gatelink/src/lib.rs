//! # gatelink
//!
//! Protocol adapters for access-control terminals.
//!
//! ## Features
//!
//! - Frame parsing and building with pluggable checksums
//! - Typed payloads for events, status, heartbeats, permissions and alarms
//! - Fail-fast message validation and device permission checks
//! - Bounded async dispatch of business data to caller-supplied handlers
//!
//! ## Quick Start
//!
//! ```no_run
//! use gatelink::{handler_fn, EntropyV48Adapter, ProcessResult, ProtocolAdapter};
//!
//! #[tokio::main]
//! async fn main() -> gatelink::Result<()> {
//!     let config = gatelink::AdapterConfig::from_env()?;
//!     let dispatcher = config
//!         .dispatcher_builder()
//!         .register(handler_fn("REAL_TIME_EVENT", |data, device_id| async move {
//!             println!("event from {device_id}: {data:?}");
//!             Ok(ProcessResult::ok("stored"))
//!         }))
//!         .build()?;
//!
//!     let adapter = EntropyV48Adapter::with_config(config).with_dispatcher(dispatcher);
//!     adapter.initialize()?;
//!
//!     let frame: Vec<u8> = Vec::new(); // bytes read from the terminal
//!     let message = adapter.parse(&frame, 1)?;
//!     if adapter.validate(Some(&message)).valid {
//!         let result = adapter.dispatch_message(&message).await;
//!         println!("{result:?}");
//!     }
//!
//!     adapter.destroy();
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod entropy;
pub mod error;
pub mod lifecycle;

// Re-exports
pub use adapter::ProtocolAdapter;
pub use config::AdapterConfig;
pub use entropy::EntropyV48Adapter;
pub use error::{Error, Result};
pub use lifecycle::AdapterState;

// Re-export lower layers
pub use gatelink_core::{
    Checksum, Crc32, DeviceLookup, FrameCodec, FrameError, LookupError, OnesComplementSum,
    ResponseKind, SharedChecksum,
};
pub use gatelink_dispatch::{
    handler_fn, BusinessError, BusinessHandler, DispatchFuture, Dispatcher, DispatcherBuilder,
};
pub use gatelink_types::{
    BusinessData, DeviceRecord, Message, Payload, PermissionResult, ProcessResult,
    ValidationCode, ValidationResult,
};
