//! Handler registry and bounded task dispatch

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use gatelink_types::{BusinessData, ProcessResult};

use crate::{
    error::{Error, Result},
    future::DispatchFuture,
    handler::BusinessHandler,
};

/// Handler tasks allowed to run at once, across all devices
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Collects handlers before the dispatcher is frozen
pub struct DispatcherBuilder {
    handlers: Vec<Arc<dyn BusinessHandler>>,
    max_in_flight: usize,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Set the bound on concurrently running handler tasks
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Register a handler under its business type
    pub fn register(mut self, handler: impl BusinessHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Register an already shared handler
    pub fn register_arc(mut self, handler: Arc<dyn BusinessHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Build on the runtime of the calling context
    pub fn build(self) -> Result<Dispatcher> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        self.build_on(runtime)
    }

    /// Build on an explicit runtime
    pub fn build_on(self, runtime: Handle) -> Result<Dispatcher> {
        if self.max_in_flight == 0 {
            return Err(Error::ZeroConcurrency);
        }

        let mut handlers = HashMap::with_capacity(self.handlers.len());
        for handler in self.handlers {
            let business_type = handler.business_type().to_string();
            if handlers.contains_key(&business_type) {
                return Err(Error::DuplicateHandler(business_type));
            }
            handlers.insert(business_type, handler);
        }

        debug!(
            handlers = handlers.len(),
            max_in_flight = self.max_in_flight,
            "Dispatcher built"
        );

        Ok(Dispatcher {
            handlers: Arc::new(handlers),
            permits: Arc::new(Semaphore::new(self.max_in_flight)),
            max_in_flight: self.max_in_flight,
            runtime,
        })
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes business data to the handler registered for its type
///
/// The registry is immutable once built, so lookups take no lock. Cloning
/// shares handlers and the in-flight bound.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<HashMap<String, Arc<dyn BusinessHandler>>>,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    runtime: Handle,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Check if a handler is registered for `business_type`
    pub fn has_handler(&self, business_type: &str) -> bool {
        self.handlers.contains_key(business_type)
    }

    /// Registered business types, sorted
    pub fn business_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Free in-flight slots right now
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Dispatch `data` to the handler for `business_type`
    ///
    /// Unknown types resolve immediately to `UNKNOWN_BUSINESS_TYPE`. Known
    /// types take a free slot and spawn one task that holds it while the
    /// handler runs. With every slot taken the call resolves immediately to
    /// `BUSINESS_PROCESS_FAILED`; nothing queues behind the bound.
    pub fn process(&self, business_type: &str, data: BusinessData, device_id: i64) -> DispatchFuture {
        let Some(handler) = self.handlers.get(business_type).cloned() else {
            warn!(business_type, device_id, "No handler registered");
            return DispatchFuture::ready(ProcessResult::unknown_business_type(business_type));
        };

        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            warn!(
                business_type,
                device_id,
                max_in_flight = self.max_in_flight,
                "Dispatcher at capacity"
            );
            return DispatchFuture::ready(ProcessResult::failure(
                ProcessResult::BUSINESS_PROCESS_FAILED,
                format!("dispatcher at capacity ({} in flight)", self.max_in_flight),
            ));
        };

        let business_type = business_type.to_string();

        let task = self.runtime.spawn(async move {
            let _permit = permit;

            debug!(business_type = %business_type, device_id, "Running business handler");

            match handler.handle(data, device_id).await {
                Ok(result) => result,
                Err(e) => {
                    error!(
                        business_type = %business_type,
                        device_id,
                        code = e.code(),
                        error = %e,
                        "Business handler failed"
                    );
                    e.into()
                }
            }
        });

        DispatchFuture::Spawned(task)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("business_types", &self.business_types())
            .field("max_in_flight", &self.max_in_flight)
            .finish()
    }
}
