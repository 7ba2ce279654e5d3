//! High-level error types

use crate::lifecycle::AdapterState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Frame error: {0}")]
    Frame(#[from] gatelink_core::FrameError),

    #[error("Build error: {0}")]
    Build(#[from] gatelink_core::BuildError),

    #[error("Type error: {0}")]
    Types(#[from] gatelink_types::Error),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] gatelink_dispatch::Error),

    #[error("Invalid adapter state: cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: AdapterState,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<gatelink_core::Error> for Error {
    fn from(err: gatelink_core::Error) -> Self {
        match err {
            gatelink_core::Error::Frame(e) => Self::Frame(e),
            gatelink_core::Error::Build(e) => Self::Build(e),
        }
    }
}

impl Error {
    /// Check if the device should be answered with a NAK
    pub fn should_nak(&self) -> bool {
        match self {
            Self::Frame(e) => gatelink_core::Error::Frame(e.clone()).should_nak(),
            _ => false,
        }
    }
}
