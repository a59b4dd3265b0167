//! Cart synchronization engine for TurboCart.
//!
//! Keeps a client-side mirror of an authoritative cart consistent while the
//! user mutates it:
//!
//! - **Queue**: `MutationQueue` sends mutations one at a time, in submission order
//! - **Engine**: `SyncEngine` applies mutations optimistically, re-fetches after
//!   each one, and discards stale fetches by ticket
//! - **Events**: `CartEvent` stream for a presentation layer, detachable at any time
//! - **Transport**: `CartTransport` seam; `InMemoryStore` is an in-process store
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use turbo_cart_sync::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), SyncError> {
//! let store = Arc::new(
//!     InMemoryStore::new(Currency::KES)
//!         .with_product("kikoi", "Kikoi", Money::new(80_000, Currency::KES)),
//! );
//! let engine = SyncEngine::new("cart-1", store, SyncConfig::default());
//!
//! engine.add("kikoi").await?;
//! engine.increase("kikoi").await?;
//!
//! let model = engine.render();
//! assert_eq!(model.item_count, 2);
//! assert_eq!(model.subtotal_display, "Ksh 1600.00");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod memory;
pub mod queue;
pub mod state;
pub mod transport;

pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::{SyncError, TransportError};
pub use events::{CartEvent, CartObserver, EventSubscription};
pub use memory::InMemoryStore;
pub use queue::{MutationQueue, MutationTicket};
pub use state::SyncState;
pub use transport::CartTransport;

/// Prelude for convenient imports.
pub mod prelude {
    pub use turbo_cart::prelude::*;

    pub use crate::config::SyncConfig;
    pub use crate::engine::SyncEngine;
    pub use crate::error::{SyncError, TransportError};
    pub use crate::events::{CartEvent, CartObserver, EventSubscription};
    pub use crate::memory::InMemoryStore;
    pub use crate::queue::{MutationQueue, MutationTicket, MutationResult};
    pub use crate::state::SyncState;
    pub use crate::transport::CartTransport;
}
