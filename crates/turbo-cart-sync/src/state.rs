//! Per-cart synchronization state.

use serde::Serialize;
use std::fmt;

/// Where the engine is in its mutation cycle.
///
/// `Idle → Mutating → Refreshing → Idle`. A refresh started from `Idle`
/// leaves the engine `Idle`. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    /// A mutation request is in flight.
    Mutating,
    /// A post-mutation refresh is in flight and no mutation is.
    Refreshing,
    Stopped,
}

impl SyncState {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Mutating | Self::Refreshing)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Mutating => write!(f, "mutating"),
            Self::Refreshing => write!(f, "refreshing"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
