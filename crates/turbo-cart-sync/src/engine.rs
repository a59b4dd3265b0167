//! The cart synchronization engine.
//!
//! One `SyncEngine` owns one cart. It applies mutations optimistically,
//! serializes them through a [`MutationQueue`], re-fetches the full cart after
//! each successful mutation, and reconciles fetched carts by ticket so a late
//! response can never overwrite a newer one.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};
use turbo_cart::operation::ProductListing;
use turbo_cart::payload::ServerCartPayload;
use turbo_cart::projector::{project, RenderModel};
use turbo_cart::snapshot::CartSnapshot;
use turbo_cart::{CartId, Mutation, Operation, ProductId, RequestId};

use crate::config::SyncConfig;
use crate::error::{SyncError, TransportError};
use crate::events::{CartEvent, EventSink, EventSubscription};
use crate::queue::{Completion, MutationHandler, MutationQueue, MutationTicket};
use crate::state::SyncState;
use crate::transport::{bounded, check_ack, CartTransport};

/// An operation applied locally and not yet reconciled.
struct PendingOp {
    operation: Operation,
    /// Ticket of the first refresh issued after the store acknowledged it.
    ticket: Option<u64>,
}

/// Mutable engine state. Guarded by one mutex that is never held across `.await`.
struct EngineState {
    confirmed: Arc<CartSnapshot>,
    /// `confirmed` with every pending operation replayed on top.
    view: Arc<CartSnapshot>,
    view_confirmed: bool,
    /// Operations applied locally whose reconciliation is outstanding, oldest first.
    pending: Vec<PendingOp>,
    last_request_id: u64,
    mutating: bool,
    post_mutation_refreshes: usize,
    /// Last refresh ticket handed out.
    issued_ticket: u64,
    /// Ticket of the response `confirmed` came from.
    held_ticket: u64,
    stopped: bool,
    events: EventSink,
}

impl EngineState {
    fn new(initial: Arc<CartSnapshot>) -> Self {
        Self {
            view: initial.clone(),
            confirmed: initial,
            view_confirmed: true,
            pending: Vec::new(),
            last_request_id: 0,
            mutating: false,
            post_mutation_refreshes: 0,
            issued_ticket: 0,
            held_ticket: 0,
            stopped: false,
            events: EventSink::default(),
        }
    }

    fn phase(&self) -> SyncState {
        if self.stopped {
            SyncState::Stopped
        } else if self.mutating {
            SyncState::Mutating
        } else if self.post_mutation_refreshes > 0 {
            SyncState::Refreshing
        } else {
            SyncState::Idle
        }
    }

    fn issue_ticket(&mut self) -> u64 {
        self.issued_ticket += 1;
        self.issued_ticket
    }

    fn settle(&mut self, request_id: RequestId) {
        self.pending.retain(|p| p.operation.request_id != request_id);
    }

    /// Drop every acknowledged operation a response with `ticket` already reflects.
    fn settle_through(&mut self, ticket: u64) {
        self.pending
            .retain(|p| !p.ticket.is_some_and(|acked| acked <= ticket));
    }

    fn mark_acknowledged(&mut self, request_id: RequestId, ticket: u64) {
        if let Some(p) = self
            .pending
            .iter_mut()
            .find(|p| p.operation.request_id == request_id)
        {
            p.ticket = Some(ticket);
        }
    }
}

struct EngineInner<T> {
    cart_id: CartId,
    transport: T,
    config: SyncConfig,
    state: Mutex<EngineState>,
    confirmed_tx: watch::Sender<Arc<CartSnapshot>>,
    /// Signalled when the last post-mutation refresh finishes.
    refreshes_idle: Notify,
}

impl<T: CartTransport> EngineInner<T> {
    /// Recompute the optimistic view and tell the subscriber if it changed.
    fn publish_view(&self, state: &mut EngineState) {
        let max = self.config.max_quantity_per_line;
        let view = state
            .pending
            .iter()
            .fold(state.confirmed.clone(), |snapshot, p| {
                Arc::new(snapshot.apply_optimistic(&p.operation.mutation, max))
            });
        let confirmed = state.pending.is_empty();

        if *view == *state.view && confirmed == state.view_confirmed {
            return;
        }

        state.view = view;
        state.view_confirmed = confirmed;
        state.events.emit(CartEvent::SnapshotChanged {
            model: project(&state.view),
            confirmed,
        });
    }

    /// Fold a fetched cart into the confirmed snapshot, or discard it if stale.
    fn reconcile(
        &self,
        state: &mut EngineState,
        ticket: u64,
        fetched: Result<ServerCartPayload, TransportError>,
    ) -> Result<Arc<CartSnapshot>, SyncError> {
        let payload = match fetched {
            Ok(payload) => payload,
            Err(reason) => return Err(self.refresh_failed(state, ticket, reason)),
        };

        if ticket <= state.held_ticket {
            debug!(
                cart_id = %self.cart_id,
                ticket,
                held_ticket = state.held_ticket,
                "discarding stale cart response"
            );
            return Ok(state.confirmed.clone());
        }

        let version = state.confirmed.version() + 1;
        let decoded = match payload.decode(version, self.config.currency) {
            Ok(decoded) => decoded,
            Err(e) => return Err(self.refresh_failed(state, ticket, e.into())),
        };

        if !decoded.dropped.is_empty() {
            warn!(
                cart_id = %self.cart_id,
                dropped = ?decoded.dropped,
                "store sent lines with non-positive quantity"
            );
        }
        if decoded.total_drift() {
            warn!(
                cart_id = %self.cart_id,
                server_total = ?decoded.server_total,
                subtotal = %decoded.snapshot.subtotal(),
                "store total differs from recomputed subtotal"
            );
        }

        let snapshot = Arc::new(decoded.snapshot);
        state.held_ticket = ticket;
        state.confirmed = snapshot.clone();
        state.settle_through(ticket);
        self.confirmed_tx.send_replace(snapshot.clone());

        info!(
            cart_id = %self.cart_id,
            version,
            ticket,
            items = snapshot.items().len(),
            "cart reconciled"
        );
        Ok(snapshot)
    }

    fn refresh_failed(&self, state: &mut EngineState, ticket: u64, reason: TransportError) -> SyncError {
        warn!(cart_id = %self.cart_id, ticket, error = %reason, "cart refresh failed");
        state.events.emit(CartEvent::RefreshFailed {
            reason: reason.clone(),
        });
        SyncError::RefreshFailed(reason)
    }

    fn fail_mutation(&self, operation: Operation, reason: TransportError, completion: Completion) {
        let request_id = operation.request_id;
        {
            let mut state = self.state.lock();
            state.mutating = false;
            state.settle(request_id);
            warn!(
                cart_id = %self.cart_id,
                request_id = %request_id,
                mutation = operation.mutation.kind(),
                error = %reason,
                "mutation failed; rolling back"
            );
            state.events.emit(CartEvent::MutationFailed {
                operation,
                reason: reason.clone(),
            });
            self.publish_view(&mut state);
        }
        completion.complete(Err(SyncError::MutationFailed {
            request_id,
            source: reason,
        }));
    }

    /// Post-mutation refresh. Runs off the queue so the next mutation can start.
    async fn confirm_mutation(self: Arc<Self>, ticket: u64, request_id: RequestId, completion: Completion) {
        let fetched = bounded(self.config.transport_timeout, self.transport.fetch_cart()).await;

        let result = {
            let mut state = self.state.lock();
            state.post_mutation_refreshes -= 1;
            state.settle(request_id);
            let result = self.reconcile(&mut state, ticket, fetched);
            self.publish_view(&mut state);
            if state.post_mutation_refreshes == 0 {
                self.refreshes_idle.notify_waiters();
            }
            result
        };

        if completion.is_abandoned() {
            debug!(cart_id = %self.cart_id, request_id = %request_id, "mutation reconciled with no one waiting");
        }
        completion.complete(result);
    }
}

/// Queue-facing half of the engine.
struct Dispatcher<T>(Arc<EngineInner<T>>);

#[async_trait]
impl<T: CartTransport> MutationHandler for Dispatcher<T> {
    async fn dispatch(&self, operation: Operation, completion: Completion) {
        let inner = &self.0;

        {
            let mut state = inner.state.lock();
            if state.mutating {
                error!(
                    cart_id = %inner.cart_id,
                    request_id = %operation.request_id,
                    "second mutation dispatched while one is in flight"
                );
                state.settle(operation.request_id);
                inner.publish_view(&mut state);
                drop(state);
                completion.complete(Err(SyncError::ConcurrencyViolation(format!(
                    "{} dispatched while another mutation was in flight",
                    operation.request_id
                ))));
                return;
            }
            state.mutating = true;
        }

        let sent = bounded(inner.config.transport_timeout, inner.transport.mutate(&operation))
            .await
            .and_then(check_ack);

        let sent = match sent {
            Err(e) if e.is_not_found() && matches!(operation.mutation, Mutation::Remove { .. }) => {
                debug!(
                    cart_id = %inner.cart_id,
                    request_id = %operation.request_id,
                    "removal of unknown product treated as success"
                );
                Ok(())
            }
            other => other,
        };

        if let Err(reason) = sent {
            inner.fail_mutation(operation, reason, completion);
            return;
        }

        let ticket = {
            let mut state = inner.state.lock();
            state.mutating = false;
            state.post_mutation_refreshes += 1;
            let ticket = state.issue_ticket();
            state.mark_acknowledged(operation.request_id, ticket);
            ticket
        };
        debug!(
            cart_id = %inner.cart_id,
            request_id = %operation.request_id,
            ticket,
            "mutation acknowledged; refreshing"
        );

        tokio::spawn(inner.clone().confirm_mutation(ticket, operation.request_id, completion));
    }
}

/// Mirrors one authoritative cart.
///
/// Cheap to clone; clones share the same cart. Must be created inside a
/// tokio runtime.
pub struct SyncEngine<T> {
    inner: Arc<EngineInner<T>>,
    queue: Arc<MutationQueue>,
}

impl<T> Clone for SyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            queue: self.queue.clone(),
        }
    }
}

impl<T: CartTransport> SyncEngine<T> {
    /// Start an engine with an empty cart at version 0.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(cart_id: impl Into<CartId>, transport: T, config: SyncConfig) -> Self {
        let initial = CartSnapshot::empty(config.currency);
        Self::with_snapshot(cart_id, transport, config, initial)
    }

    /// Start an engine from a snapshot the host already holds (e.g. server-rendered).
    pub fn with_snapshot(
        cart_id: impl Into<CartId>,
        transport: T,
        config: SyncConfig,
        initial: CartSnapshot,
    ) -> Self {
        let cart_id = cart_id.into();
        let initial = Arc::new(initial);
        let (confirmed_tx, _) = watch::channel(initial.clone());

        let inner = Arc::new(EngineInner {
            cart_id: cart_id.clone(),
            transport,
            config,
            state: Mutex::new(EngineState::new(initial)),
            confirmed_tx,
            refreshes_idle: Notify::new(),
        });
        let queue = MutationQueue::spawn(cart_id, Arc::new(Dispatcher(inner.clone())));

        Self {
            inner,
            queue: Arc::new(queue),
        }
    }

    /// Start an engine and hydrate it with one full fetch.
    pub async fn connect(
        cart_id: impl Into<CartId>,
        transport: T,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        let engine = Self::new(cart_id, transport, config);
        engine.refresh().await?;
        Ok(engine)
    }

    pub fn cart_id(&self) -> &CartId {
        &self.inner.cart_id
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Latest confirmed snapshot. Never blocks on the network.
    pub fn current_snapshot(&self) -> Arc<CartSnapshot> {
        self.inner.confirmed_tx.borrow().clone()
    }

    /// Confirmed snapshot with pending mutations applied.
    pub fn optimistic_snapshot(&self) -> Arc<CartSnapshot> {
        self.inner.state.lock().view.clone()
    }

    /// Render model of what the user should currently see.
    pub fn render(&self) -> RenderModel {
        project(&self.optimistic_snapshot())
    }

    /// Receiver that observes every confirmed snapshot.
    pub fn watch_confirmed(&self) -> watch::Receiver<Arc<CartSnapshot>> {
        self.inner.confirmed_tx.subscribe()
    }

    pub fn state(&self) -> SyncState {
        self.inner.state.lock().phase()
    }

    /// Mutations applied locally but not yet reconciled.
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Attach a presentation layer, replacing any previous one.
    pub fn subscribe(&self) -> EventSubscription {
        self.inner.state.lock().events.subscribe()
    }

    /// Stop delivering events. Reconciliation carries on.
    pub fn detach(&self) {
        self.inner.state.lock().events.detach();
    }

    /// Apply `mutation` locally and queue it for the store.
    pub fn apply(&self, mutation: Mutation) -> MutationTicket {
        let mut state = self.inner.state.lock();
        state.last_request_id += 1;
        let request_id = RequestId::new(state.last_request_id);

        if state.stopped {
            return MutationTicket::ready(request_id, Err(SyncError::Shutdown));
        }
        if let Err(e) = mutation.validate(self.inner.config.max_quantity_per_line) {
            warn!(cart_id = %self.inner.cart_id, request_id = %request_id, error = %e, "rejected mutation");
            return MutationTicket::ready(request_id, Err(e.into()));
        }

        let operation = Operation::new(request_id, mutation);
        debug!(
            cart_id = %self.inner.cart_id,
            request_id = %request_id,
            mutation = %operation.mutation,
            "applying mutation"
        );
        state.pending.push(PendingOp {
            operation: operation.clone(),
            ticket: None,
        });
        self.inner.publish_view(&mut state);

        // Enqueue under the lock so request ids and queue order agree.
        self.queue.enqueue(operation)
    }

    /// Add one unit.
    pub fn add(&self, product_id: impl Into<ProductId>) -> MutationTicket {
        self.apply(Mutation::add(product_id))
    }

    /// Add `quantity` units of a product the UI can already describe.
    pub fn add_listing(
        &self,
        product_id: impl Into<ProductId>,
        quantity: u32,
        listing: ProductListing,
    ) -> MutationTicket {
        self.apply(Mutation::add_quantity(product_id, quantity).with_listing(listing))
    }

    pub fn remove(&self, product_id: impl Into<ProductId>) -> MutationTicket {
        self.apply(Mutation::remove(product_id))
    }

    pub fn increase(&self, product_id: impl Into<ProductId>) -> MutationTicket {
        self.apply(Mutation::increase(product_id))
    }

    pub fn decrease(&self, product_id: impl Into<ProductId>) -> MutationTicket {
        self.apply(Mutation::decrease(product_id))
    }

    /// Fetch the full cart and reconcile it.
    ///
    /// Returns the confirmed snapshot afterwards, which is an even newer one
    /// if this response turned out to be stale.
    pub async fn refresh(&self) -> Result<Arc<CartSnapshot>, SyncError> {
        let ticket = {
            let mut state = self.inner.state.lock();
            if state.stopped {
                return Err(SyncError::Shutdown);
            }
            state.issue_ticket()
        };

        let fetched = bounded(
            self.inner.config.transport_timeout,
            self.inner.transport.fetch_cart(),
        )
        .await;

        let mut state = self.inner.state.lock();
        let result = self.inner.reconcile(&mut state, ticket, fetched);
        self.inner.publish_view(&mut state);
        result
    }

    /// Stop accepting mutations, let queued ones finish and confirm, then detach.
    pub async fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.stopped {
                return;
            }
            state.stopped = true;
        }

        self.queue.close();
        self.queue.join().await;

        loop {
            // Register before checking so a wakeup between the two is not lost.
            let idle = self.inner.refreshes_idle.notified();
            if self.inner.state.lock().post_mutation_refreshes == 0 {
                break;
            }
            idle.await;
        }
        self.detach();
        info!(cart_id = %self.inner.cart_id, "sync engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use std::time::Duration;
    use turbo_cart::{Currency, Money};

    fn kes(cents: i64) -> Money {
        Money::new(cents, Currency::KES)
    }

    fn store() -> Arc<InMemoryStore> {
        Arc::new(
            InMemoryStore::new(Currency::KES)
                .with_product("kiondo", "Kiondo Basket", kes(125_000))
                .with_product("kikoi", "Kikoi", kes(80_000)),
        )
    }

    fn engine(store: &Arc<InMemoryStore>) -> SyncEngine<Arc<InMemoryStore>> {
        SyncEngine::new("cart-1", store.clone(), SyncConfig::default())
    }

    #[tokio::test]
    async fn test_current_snapshot_defaults_to_empty() {
        let engine = engine(&store());
        let snapshot = engine.current_snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.version(), 0);
        assert_eq!(engine.state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn test_connect_hydrates() {
        let store = store();
        store.seed_line("kikoi", 2);
        let engine = SyncEngine::connect("cart-1", store.clone(), SyncConfig::default())
            .await
            .unwrap();
        let snapshot = engine.current_snapshot();
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.item_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_machine_cycle() {
        let store = store();
        store.set_latency(Duration::from_millis(100));
        let engine = engine(&store);

        let ticket = engine.add("kiondo");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.state(), SyncState::Mutating);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(engine.state(), SyncState::Refreshing);

        ticket.await.unwrap();
        assert_eq!(engine.state(), SyncState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pure_refresh_stays_idle() {
        let store = store();
        store.set_latency(Duration::from_millis(100));
        let engine = engine(&store);

        let refresher = engine.clone();
        let handle = tokio::spawn(async move { refresher.refresh().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.state(), SyncState::Idle);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_optimistic_view_published_before_confirmation() {
        let store = store();
        let engine = engine(&store);
        let mut events = engine.subscribe();

        let ticket = engine.add_listing(
            "kiondo",
            1,
            ProductListing::new("Kiondo Basket", kes(125_000)),
        );

        // Published synchronously by apply(), before the queue ran.
        match events.try_recv() {
            Some(CartEvent::SnapshotChanged { model, confirmed }) => {
                assert!(!confirmed);
                assert_eq!(model.item_count, 1);
                assert_eq!(model.version, 0);
            }
            other => panic!("expected unconfirmed snapshot, got {other:?}"),
        }
        assert_eq!(engine.pending_count(), 1);
        assert!(engine.current_snapshot().is_empty());

        ticket.await.unwrap();
        match events.drain().last() {
            Some(CartEvent::SnapshotChanged { model, confirmed }) => {
                assert!(*confirmed);
                assert_eq!(model.version, 1);
            }
            other => panic!("expected confirmed snapshot, got {other:?}"),
        }
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_mutation_rejected_without_request() {
        let store = store();
        let engine = engine(&store);

        let result = engine.apply(Mutation::add_quantity("kiondo", 0)).await;
        assert!(matches!(result, Err(SyncError::Invalid(_))));
        assert!(store.mutation_log().is_empty());
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_timeout_rolls_back() {
        let store = store();
        store.set_latency(Duration::from_secs(5));
        let config = SyncConfig::default().with_transport_timeout(Duration::from_millis(200));
        let engine = SyncEngine::new("cart-1", store.clone(), config);
        let mut events = engine.subscribe();

        let result = engine.add("kiondo").await;
        match result {
            Err(SyncError::MutationFailed { source, .. }) => assert!(source.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }

        let failures = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, CartEvent::MutationFailed { .. }))
            .count();
        assert_eq!(failures, 1);
        assert_eq!(engine.state(), SyncState::Idle);
        assert!(engine.current_snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_confirmed() {
        let store = store();
        store.seed_line("kikoi", 1);
        let engine = engine(&store);
        let before = engine.refresh().await.unwrap();

        let mut events = engine.subscribe();
        store.fail_next_fetch(TransportError::Http {
            status: 502,
            message: "bad gateway".into(),
        });

        assert!(matches!(engine.refresh().await, Err(SyncError::RefreshFailed(_))));
        assert_eq!(engine.current_snapshot(), before);
        assert!(matches!(
            events.drain().as_slice(),
            [CartEvent::RefreshFailed { .. }]
        ));

        // The caller may retry.
        assert_eq!(engine.refresh().await.unwrap().version(), 2);
    }

    #[tokio::test]
    async fn test_post_mutation_refresh_failure() {
        let store = store();
        let engine = engine(&store);
        let mut events = engine.subscribe();
        store.fail_next_fetch(TransportError::Connection("reset".into()));

        let result = engine.add("kiondo").await;
        assert!(matches!(result, Err(SyncError::RefreshFailed(_))));
        assert_eq!(engine.pending_count(), 0);
        assert!(events
            .drain()
            .iter()
            .any(|e| matches!(e, CartEvent::RefreshFailed { .. })));

        // The store did apply it; the next refresh shows it.
        assert_eq!(engine.refresh().await.unwrap().item_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_ack_is_a_failure() {
        let store = Arc::new(
            InMemoryStore::new(Currency::KES).with_stocked_product("mug", "Mug", kes(500), 0),
        );
        let engine = engine(&store);

        let result = engine.add("mug").await;
        match result {
            Err(SyncError::MutationFailed { source, .. }) => assert_eq!(
                source,
                TransportError::Rejected {
                    message: "Product is out of stock".into()
                }
            ),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_ticket_still_reconciles() {
        let store = store();
        let engine = engine(&store);
        let mut confirmed = engine.watch_confirmed();

        drop(engine.add("kiondo"));
        confirmed.changed().await.unwrap();

        assert_eq!(confirmed.borrow().item_count(), 1);
        assert_eq!(engine.current_snapshot().version(), 1);
    }

    #[tokio::test]
    async fn test_detach_suppresses_events_but_not_state() {
        let store = store();
        let engine = engine(&store);
        let mut events = engine.subscribe();
        engine.detach();

        engine.add("kiondo").await.unwrap();
        assert!(events.drain().is_empty());
        assert_eq!(engine.current_snapshot().item_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drains_then_rejects() {
        let store = store();
        store.set_latency(Duration::from_millis(10));
        let engine = engine(&store);

        let queued = engine.add("kiondo");
        engine.shutdown().await;
        assert_eq!(engine.state(), SyncState::Stopped);

        assert!(queued.await.is_ok());
        assert_eq!(engine.add("kikoi").await, Err(SyncError::Shutdown));
        assert_eq!(engine.refresh().await, Err(SyncError::Shutdown));
        assert_eq!(store.mutation_log().len(), 1);
    }
    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_confirmation() {
        let store = store();
        store.set_latency(Duration::from_millis(10));
        let engine = engine(&store);
        let mut events = engine.subscribe();

        drop(engine.add_listing(
            "kiondo",
            1,
            ProductListing::new("Kiondo Basket", kes(125_000)),
        ));
        engine.shutdown().await;

        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.current_snapshot().item_count(), 1);
        match events.drain().last() {
            Some(CartEvent::SnapshotChanged { model, confirmed }) => {
                assert!(*confirmed);
                assert_eq!(model.item_count, 1);
            }
            other => panic!("expected confirmed snapshot, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_refresh_settles_earlier_acknowledged_mutation() {
        let store = store();
        store.set_latency(Duration::from_millis(5));
        // First post-mutation fetch is slow, the second one fast.
        store.delay_next_fetches([Duration::from_millis(100), Duration::from_millis(10)]);
        let engine = engine(&store);
        let listing = || ProductListing::new("Kiondo Basket", kes(125_000));

        let first = engine.add_listing("kiondo", 1, listing());
        let second = engine.add_listing("kiondo", 1, listing());

        let confirmed = second.await.unwrap();
        assert_eq!(confirmed.item_count(), 2);
        // The first mutation is already in that response; it must not be replayed.
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.optimistic_snapshot().item_count(), 2);
        assert_eq!(engine.state(), SyncState::Refreshing);

        let late = first.await.unwrap();
        assert_eq!(late, confirmed);
        assert_eq!(engine.render().item_count, 2);
        assert_eq!(engine.state(), SyncState::Idle);
    }
}
