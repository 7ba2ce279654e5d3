//! Adapter lifecycle
//!
//! Created → Running → Destroyed. Destroy is idempotent and final.

use std::fmt;

use parking_lot::RwLock;
use tracing::info;

use crate::error::{Error, Result};

/// Adapter lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Constructed, not yet initialized
    Created,

    /// Initialized and accepting business calls
    Running,

    /// Destroyed, cannot be restarted
    Destroyed,
}

impl AdapterState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Destroyed => "DESTROYED",
        }
    }
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thread-safe lifecycle flag
#[derive(Debug)]
pub struct Lifecycle {
    protocol: &'static str,
    state: RwLock<AdapterState>,
}

impl Lifecycle {
    pub fn new(protocol: &'static str) -> Self {
        Self {
            protocol,
            state: RwLock::new(AdapterState::Created),
        }
    }

    pub fn state(&self) -> AdapterState {
        *self.state.read()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state(), AdapterState::Running)
    }

    /// Move from Created to Running
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.write();

        if *state != AdapterState::Created {
            return Err(Error::InvalidState {
                action: "initialize",
                state: *state,
            });
        }

        *state = AdapterState::Running;
        info!(protocol = self.protocol, "Adapter initialized");
        Ok(())
    }

    /// Move to Destroyed from any state
    pub fn stop(&self) {
        let mut state = self.state.write();

        if *state != AdapterState::Destroyed {
            *state = AdapterState::Destroyed;
            info!(protocol = self.protocol, "Adapter destroyed");
        }
    }
}
