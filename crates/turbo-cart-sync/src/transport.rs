//! Contract between the engine and the authoritative store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use turbo_cart::payload::{ServerCartPayload, ServerMutationAck};
use turbo_cart::Operation;

use crate::error::TransportError;

/// Performs the actual calls against the authoritative store.
///
/// The engine is transport-agnostic: HTTP, an in-process store, or a test
/// double all plug in here. Anti-forgery tokens and session handling belong
/// to the implementation.
#[async_trait]
pub trait CartTransport: Send + Sync + 'static {
    /// Fetch the full authoritative cart.
    async fn fetch_cart(&self) -> Result<ServerCartPayload, TransportError>;

    /// Send one mutation.
    async fn mutate(&self, operation: &Operation) -> Result<ServerMutationAck, TransportError>;
}

#[async_trait]
impl<T: CartTransport + ?Sized> CartTransport for Arc<T> {
    async fn fetch_cart(&self) -> Result<ServerCartPayload, TransportError> {
        (**self).fetch_cart().await
    }

    async fn mutate(&self, operation: &Operation) -> Result<ServerMutationAck, TransportError> {
        (**self).mutate(operation).await
    }
}

/// Run a transport call under a timeout; expiry becomes `TransportError::Timeout`.
pub(crate) async fn bounded<F, R>(limit: Duration, call: F) -> Result<R, TransportError>
where
    F: Future<Output = Result<R, TransportError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(limit)),
    }
}

/// Turn an error ack into a transport failure.
pub(crate) fn check_ack(ack: ServerMutationAck) -> Result<(), TransportError> {
    if ack.is_success() {
        Ok(())
    } else {
        Err(TransportError::Rejected {
            message: ack
                .message
                .unwrap_or_else(|| "mutation rejected".to_string()),
        })
    }
}
