//! Sync and transport error types.

use std::time::Duration;

use thiserror::Error;
use turbo_cart::{CartError, RequestId};

/// Failure reported by a [`CartTransport`](crate::CartTransport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Non-2xx response.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// No response within the configured bound.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Network-level failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store answered but refused the mutation.
    #[error("Rejected by store: {message}")]
    Rejected { message: String },

    /// The response could not be turned into cart state.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl TransportError {
    /// True for a 404 answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<CartError> for TransportError {
    fn from(e: CartError) -> Self {
        TransportError::InvalidPayload(e.to_string())
    }
}

/// Errors surfaced by the sync engine to callers awaiting a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The mutation request failed; the view was rolled back.
    #[error("Mutation {request_id} failed: {source}")]
    MutationFailed {
        request_id: RequestId,
        source: TransportError,
    },

    /// A full-cart fetch failed; the last confirmed snapshot is kept.
    #[error("Refresh failed: {0}")]
    RefreshFailed(#[source] TransportError),

    /// The mutation was rejected before reaching the queue.
    #[error("Invalid mutation: {0}")]
    Invalid(#[from] CartError),

    /// Two mutation requests were in flight for one cart.
    #[error("Concurrency violation: {0}")]
    ConcurrencyViolation(String),

    /// The engine no longer accepts work.
    #[error("Sync engine shut down")]
    Shutdown,
}

impl SyncError {
    /// The transport failure behind this error, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::MutationFailed { source, .. } | Self::RefreshFailed(source) => Some(source),
            _ => None,
        }
    }
}
