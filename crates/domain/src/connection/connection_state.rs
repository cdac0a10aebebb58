use serde::{Deserialize, Serialize};

use crate::error::InstrumentError;

/// Lifecycle state of an instrument connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No socket held; initial state and the state after disconnect
    #[default]
    Closed,
    /// Socket connected and usable for execute
    Open,
}

impl ConnectionState {
    /// Check if currently open
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Transition to open state. Re-opening an open connection is refused.
    pub fn to_open(&self) -> Result<Self, InstrumentError> {
        match self {
            Self::Closed => Ok(Self::Open),
            Self::Open => Err(InstrumentError::AlreadyOpen),
        }
    }

    /// Transition to closed state, allowed from any state
    pub fn to_closed(&self) -> Self {
        Self::Closed
    }
}
