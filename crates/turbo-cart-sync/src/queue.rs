//! Per-cart FIFO that keeps at most one mutation request in flight.
//!
//! ```text
//!   enqueue() ──▶ mpsc (FIFO) ──▶ worker ──▶ MutationHandler::dispatch
//!       │                                         │
//!       └──── MutationTicket ◀──── oneshot ◀──────┘ (resolved when reconciled)
//! ```
//!
//! The worker takes the next job only after `dispatch` returns, i.e. once the
//! mutation request itself has completed. The handler may resolve the job's
//! [`Completion`] later, after its follow-up refresh.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};
use turbo_cart::snapshot::CartSnapshot;
use turbo_cart::{CartId, Operation, RequestId};

use crate::error::SyncError;

/// What a mutation eventually resolves to: the confirmed snapshot after it.
pub type MutationResult = Result<Arc<CartSnapshot>, SyncError>;

/// Receives operations from the queue one at a time.
#[async_trait]
pub trait MutationHandler: Send + Sync + 'static {
    /// Perform the mutation request for `operation`.
    ///
    /// Must not return before the request completes. `completion` may be
    /// resolved now or handed to a later task.
    async fn dispatch(&self, operation: Operation, completion: Completion);
}

/// Resolves the [`MutationTicket`] of one operation.
#[derive(Debug)]
pub struct Completion {
    request_id: RequestId,
    tx: oneshot::Sender<MutationResult>,
}

impl Completion {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// True when nobody is waiting on the ticket any more.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    /// Deliver the result. A dropped ticket is not an error.
    pub fn complete(self, result: MutationResult) {
        let _ = self.tx.send(result);
    }
}

/// Future for the outcome of an enqueued operation.
///
/// Dropping it does not cancel the operation.
#[derive(Debug)]
pub struct MutationTicket {
    request_id: RequestId,
    rx: oneshot::Receiver<MutationResult>,
}

impl MutationTicket {
    fn pair(request_id: RequestId) -> (Completion, Self) {
        let (tx, rx) = oneshot::channel();
        (Completion { request_id, tx }, Self { request_id, rx })
    }

    /// A ticket that is already resolved.
    pub fn ready(request_id: RequestId, result: MutationResult) -> Self {
        let (completion, ticket) = Self::pair(request_id);
        completion.complete(result);
        ticket
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

impl Future for MutationTicket {
    type Output = MutationResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SyncError::Shutdown)))
    }
}

struct Job {
    operation: Operation,
    completion: Completion,
}

/// Serializes mutations for one cart.
pub struct MutationQueue {
    cart_id: CartId,
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    depth: Arc<AtomicUsize>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MutationQueue {
    /// Start the worker task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn<H: MutationHandler>(cart_id: CartId, handler: Arc<H>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        let worker = tokio::spawn(run_worker(cart_id.clone(), handler, rx, depth.clone()));

        Self {
            cart_id,
            tx: Mutex::new(Some(tx)),
            depth,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Append `operation`; it is dispatched once every earlier one has been.
    pub fn enqueue(&self, operation: Operation) -> MutationTicket {
        let (completion, ticket) = MutationTicket::pair(operation.request_id);

        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            completion.complete(Err(SyncError::Shutdown));
            return ticket;
        };

        self.depth.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::error::SendError(job)) = tx.send(Job {
            operation,
            completion,
        }) {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            job.completion.complete(Err(SyncError::Shutdown));
        }
        ticket
    }

    /// Operations waiting or in flight.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Stop accepting operations. Already queued ones still run.
    pub fn close(&self) {
        if self.tx.lock().take().is_some() {
            debug!(cart_id = %self.cart_id, "mutation queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }

    /// Wait for the worker to drain. Call after [`close`](Self::close).
    pub async fn join(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(cart_id = %self.cart_id, error = %e, "mutation worker failed");
            }
        }
    }
}

async fn run_worker<H: MutationHandler>(
    cart_id: CartId,
    handler: Arc<H>,
    mut rx: mpsc::UnboundedReceiver<Job>,
    depth: Arc<AtomicUsize>,
) {
    while let Some(Job {
        operation,
        completion,
    }) = rx.recv().await
    {
        debug!(
            cart_id = %cart_id,
            request_id = %operation.request_id,
            mutation = operation.mutation.kind(),
            "dispatching mutation"
        );
        handler.dispatch(operation, completion).await;
        depth.fetch_sub(1, Ordering::SeqCst);
    }
    debug!(cart_id = %cart_id, "mutation worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use turbo_cart::{Currency, Mutation};

    /// Records dispatch order and the peak number of overlapping dispatches.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<RequestId>>,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MutationHandler for Recorder {
        async fn dispatch(&self, operation: Operation, completion: Completion) {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.seen.lock().push(operation.request_id);
            self.active.fetch_sub(1, Ordering::SeqCst);
            completion.complete(Ok(Arc::new(CartSnapshot::empty(Currency::KES))));
        }
    }

    fn op(n: u64) -> Operation {
        Operation::new(RequestId::new(n), Mutation::add("p1"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatches_in_order_one_at_a_time() {
        let recorder = Arc::new(Recorder::default());
        let queue = MutationQueue::spawn(CartId::new("c1"), recorder.clone());

        let tickets: Vec<_> = (1..=5).map(|n| queue.enqueue(op(n))).collect();
        assert_eq!(queue.depth(), 5);

        for ticket in tickets {
            ticket.await.unwrap();
        }

        let seen = recorder.seen.lock().clone();
        assert_eq!(seen, (1..=5).map(RequestId::new).collect::<Vec<_>>());
        assert_eq!(recorder.peak.load(Ordering::SeqCst), 1);
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_queue_rejects_but_drains() {
        let recorder = Arc::new(Recorder::default());
        let queue = MutationQueue::spawn(CartId::new("c1"), recorder.clone());

        let queued = queue.enqueue(op(1));
        queue.close();
        assert!(queue.is_closed());

        let rejected = queue.enqueue(op(2));
        assert_eq!(rejected.await, Err(SyncError::Shutdown));

        assert!(queued.await.is_ok());
        queue.join().await;
        assert_eq!(recorder.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_ready_ticket() {
        let ticket = MutationTicket::ready(RequestId::new(9), Err(SyncError::Shutdown));
        assert_eq!(ticket.request_id(), RequestId::new(9));
        assert_eq!(ticket.await, Err(SyncError::Shutdown));
    }
}
