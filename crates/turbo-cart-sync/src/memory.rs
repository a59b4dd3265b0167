//! In-process authoritative store.
//!
//! Implements the storefront's cart rules behind [`CartTransport`] so the
//! engine can be driven without a network: demos, tests, and local tools.
//! Fault injection hooks simulate slow, failing, and reordered responses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use turbo_cart::operation::QuantityDelta;
use turbo_cart::payload::{ServerCartItem, ServerCartPayload, ServerMutationAck};
use turbo_cart::{Currency, Money, Mutation, Operation, ProductId};

use crate::error::TransportError;
use crate::transport::CartTransport;

#[derive(Debug, Clone)]
struct CatalogEntry {
    id: ProductId,
    name: String,
    price: Money,
    /// `None` means unlimited.
    stock: Option<u32>,
}

#[derive(Debug, Default)]
struct StoreData {
    catalog: Vec<CatalogEntry>,
    /// Cart lines in insertion order.
    lines: Vec<(ProductId, u32)>,
    log: Vec<Operation>,
}

impl StoreData {
    fn entry(&self, id: &ProductId) -> Option<&CatalogEntry> {
        self.catalog.iter().find(|e| &e.id == id)
    }

    fn quantity(&self, id: &ProductId) -> Option<u32> {
        self.lines.iter().find(|(p, _)| p == id).map(|(_, q)| *q)
    }

    fn set_quantity(&mut self, id: &ProductId, quantity: u32) {
        match self.lines.iter_mut().find(|(p, _)| p == id) {
            Some(line) if quantity > 0 => line.1 = quantity,
            Some(_) => self.lines.retain(|(p, _)| p != id),
            None if quantity > 0 => self.lines.push((id.clone(), quantity)),
            None => {}
        }
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<ServerMutationAck, TransportError> {
        let product_id = mutation.product_id();
        let Some(entry) = self.entry(product_id).cloned() else {
            return Err(not_found(format!("No product with id {product_id}")));
        };
        let current = self.quantity(product_id);
        let stock = entry.stock.unwrap_or(u32::MAX);

        match mutation {
            Mutation::Add { quantity, .. } => {
                if stock == 0 {
                    return Ok(ServerMutationAck::error("Product is out of stock"));
                }
                let wanted = current.unwrap_or(0).saturating_add(*quantity);
                self.set_quantity(product_id, wanted.min(stock));
                Ok(ServerMutationAck::success())
            }
            Mutation::Remove { .. } => {
                if current.is_none() {
                    return Err(not_found(format!("{product_id} is not in the cart")));
                }
                self.set_quantity(product_id, 0);
                Ok(ServerMutationAck::success())
            }
            Mutation::SetQuantity { delta, .. } => {
                let Some(current) = current else {
                    return Err(not_found(format!("{product_id} is not in the cart")));
                };
                match delta {
                    QuantityDelta::Increase if current >= stock => {
                        Ok(ServerMutationAck::error("Not enough stock"))
                    }
                    QuantityDelta::Increase => {
                        self.set_quantity(product_id, current + 1);
                        Ok(ServerMutationAck::success())
                    }
                    QuantityDelta::Decrease => {
                        self.set_quantity(product_id, current - 1);
                        Ok(ServerMutationAck::success())
                    }
                }
            }
        }
    }

    fn payload(&self, currency: Currency) -> ServerCartPayload {
        let mut total = Some(Money::zero(currency));
        let items = self
            .lines
            .iter()
            .filter_map(|(id, quantity)| {
                let entry = self.entry(id)?;
                total = total
                    .and_then(|t| t.try_add(&entry.price.try_multiply(i64::from(*quantity))?));
                Some(ServerCartItem {
                    product_id: id.clone(),
                    name: entry.name.clone(),
                    unit_price: entry.price.into(),
                    quantity: i64::from(*quantity),
                })
            })
            .collect();

        ServerCartPayload {
            items,
            total: total.map(Into::into),
        }
    }
}

fn not_found(message: String) -> TransportError {
    TransportError::Http {
        status: 404,
        message,
    }
}

/// Decrements an in-flight counter when the call ends or is cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Authoritative cart held in memory.
#[derive(Debug)]
pub struct InMemoryStore {
    currency: Currency,
    data: Mutex<StoreData>,
    latency: Mutex<Duration>,
    fetch_delays: Mutex<VecDeque<Duration>>,
    next_mutation_failure: Mutex<Option<TransportError>>,
    next_fetch_failure: Mutex<Option<TransportError>>,
    active_mutations: AtomicUsize,
    peak_mutations: AtomicUsize,
    fetches: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            data: Mutex::new(StoreData::default()),
            latency: Mutex::new(Duration::ZERO),
            fetch_delays: Mutex::new(VecDeque::new()),
            next_mutation_failure: Mutex::new(None),
            next_fetch_failure: Mutex::new(None),
            active_mutations: AtomicUsize::new(0),
            peak_mutations: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Add a product with unlimited stock.
    pub fn with_product(self, id: impl Into<ProductId>, name: impl Into<String>, price: Money) -> Self {
        self.insert_product(id, name, price, None);
        self
    }

    /// Add a product with a stock limit.
    pub fn with_stocked_product(
        self,
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        self.insert_product(id, name, price, Some(stock));
        self
    }

    /// Add or replace a catalog entry.
    pub fn insert_product(
        &self,
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        stock: Option<u32>,
    ) {
        let entry = CatalogEntry {
            id: id.into(),
            name: name.into(),
            price,
            stock,
        };
        let mut data = self.data.lock();
        data.catalog.retain(|e| e.id != entry.id);
        data.catalog.push(entry);
    }

    /// Put a line straight into the cart, bypassing the mutation rules.
    pub fn seed_line(&self, id: impl Into<ProductId>, quantity: u32) {
        self.data.lock().set_quantity(&id.into(), quantity);
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// The cart as a refresh would currently return it.
    pub fn payload(&self) -> ServerCartPayload {
        self.data.lock().payload(self.currency)
    }

    /// Every mutation received, in arrival order.
    pub fn mutation_log(&self) -> Vec<Operation> {
        self.data.lock().log.clone()
    }

    /// Highest number of mutations that were ever in flight at once.
    pub fn max_concurrent_mutations(&self) -> usize {
        self.peak_mutations.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Delay applied to every call.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Per-fetch delays, consumed in order, overriding the latency.
    pub fn delay_next_fetches(&self, delays: impl IntoIterator<Item = Duration>) {
        self.fetch_delays.lock().extend(delays);
    }

    pub fn fail_next_mutation(&self, error: TransportError) {
        *self.next_mutation_failure.lock() = Some(error);
    }

    pub fn fail_next_fetch(&self, error: TransportError) {
        *self.next_fetch_failure.lock() = Some(error);
    }
}

#[async_trait]
impl CartTransport for InMemoryStore {
    async fn fetch_cart(&self) -> Result<ServerCartPayload, TransportError> {
        let fetch = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self
            .fetch_delays
            .lock()
            .pop_front()
            .unwrap_or_else(|| *self.latency.lock());
        let result = match self.next_fetch_failure.lock().take() {
            Some(error) => Err(error),
            None => Ok(self.payload()),
        };
        debug!(fetch, delay_ms = delay.as_millis() as u64, "store received fetch");

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn mutate(&self, operation: &Operation) -> Result<ServerMutationAck, TransportError> {
        let _in_flight = InFlight::enter(&self.active_mutations, &self.peak_mutations);
        self.data.lock().log.push(operation.clone());

        let delay = *self.latency.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_mutation_failure.lock().take() {
            return Err(error);
        }
        let ack = self.data.lock().apply(&operation.mutation);
        debug!(request_id = %operation.request_id, ok = ack.is_ok(), "store applied mutation");
        ack
    }
}
