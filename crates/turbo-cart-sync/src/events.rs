//! Events delivered to the presentation layer.

use tokio::sync::mpsc;
use tracing::trace;
use turbo_cart::projector::RenderModel;
use turbo_cart::Operation;

use crate::error::TransportError;

/// Something the presentation layer should react to.
///
/// Events arrive in the order the engine reconciled them.
#[derive(Debug, Clone, PartialEq)]
pub enum CartEvent {
    /// The visible cart changed. `confirmed` is false while mutations are pending.
    SnapshotChanged { model: RenderModel, confirmed: bool },
    /// A mutation failed and its optimistic effect was rolled back.
    MutationFailed {
        operation: Operation,
        reason: TransportError,
    },
    /// A full-cart fetch failed; the last confirmed snapshot still stands.
    RefreshFailed { reason: TransportError },
}

impl CartEvent {
    /// Invoke the matching observer callback.
    pub fn dispatch_to<O: CartObserver + ?Sized>(&self, observer: &mut O) {
        match self {
            Self::SnapshotChanged { model, confirmed } => {
                observer.on_snapshot_changed(model, *confirmed)
            }
            Self::MutationFailed { operation, reason } => {
                observer.on_mutation_failed(operation, reason)
            }
            Self::RefreshFailed { reason } => observer.on_refresh_failed(reason),
        }
    }
}

/// Callback-style view of [`CartEvent`].
pub trait CartObserver {
    fn on_snapshot_changed(&mut self, model: &RenderModel, confirmed: bool);

    fn on_mutation_failed(&mut self, _operation: &Operation, _reason: &TransportError) {}

    fn on_refresh_failed(&mut self, _reason: &TransportError) {}
}

/// Receiving end of the engine's event stream.
///
/// Dropping it detaches the presentation layer; the engine keeps reconciling.
#[derive(Debug)]
pub struct EventSubscription {
    rx: mpsc::UnboundedReceiver<CartEvent>,
}

impl EventSubscription {
    /// Wait for the next event. `None` once the engine detaches this subscription.
    pub async fn recv(&mut self) -> Option<CartEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<CartEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<CartEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Feed every queued event to `observer`; returns how many were delivered.
    pub fn drain_into<O: CartObserver + ?Sized>(&mut self, observer: &mut O) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.try_recv() {
            event.dispatch_to(observer);
            delivered += 1;
        }
        delivered
    }

    /// Deliver events to `observer` until the subscription is detached.
    pub async fn forward_to<O: CartObserver + ?Sized>(mut self, observer: &mut O) {
        while let Some(event) = self.recv().await {
            event.dispatch_to(observer);
        }
    }
}

/// Sending end, owned by the engine state.
#[derive(Debug, Default)]
pub(crate) struct EventSink {
    tx: Option<mpsc::UnboundedSender<CartEvent>>,
}

impl EventSink {
    /// Replace any current subscriber.
    pub(crate) fn subscribe(&mut self) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.tx = Some(tx);
        EventSubscription { rx }
    }

    pub(crate) fn detach(&mut self) {
        self.tx = None;
    }

    pub(crate) fn emit(&mut self, event: CartEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                trace!("event subscriber dropped; suppressing further events");
                self.tx = None;
            }
        }
    }
}
