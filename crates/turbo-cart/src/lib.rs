//! Cart domain types for TurboCart.
//!
//! This crate holds the pure half of the cart synchronization stack:
//!
//! - **Snapshot**: immutable `CartSnapshot` / `LineItem` with a recomputed subtotal
//! - **Operation**: `Mutation` (add / remove / set-quantity) stamped with a `RequestId`
//! - **Projector**: `project` turns a snapshot into a `RenderModel`
//! - **Payload**: wire types for full-cart responses and mutation acks
//!
//! # Example
//!
//! ```rust
//! use turbo_cart::prelude::*;
//!
//! let snapshot = CartSnapshot::empty(Currency::KES).apply_optimistic(
//!     &Mutation::add_quantity("kiondo", 2)
//!         .with_listing(ProductListing::new("Kiondo Basket", Money::new(125_000, Currency::KES))),
//!     MAX_QUANTITY_PER_ITEM,
//! );
//!
//! let model = project(&snapshot);
//! assert_eq!(model.item_count, 2);
//! assert_eq!(model.subtotal_formatted, "2500.00");
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod operation;
pub mod payload;
pub mod projector;
pub mod snapshot;

pub use error::CartError;
pub use ids::*;
pub use money::{Currency, Money};
pub use operation::{Mutation, Operation};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CartError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    pub use crate::operation::{Mutation, Operation, ProductListing, QuantityDelta};
    pub use crate::payload::{
        AckStatus, DecodedCart, ServerCartItem, ServerCartPayload, ServerMutationAck, WirePrice,
    };
    pub use crate::projector::{project, RenderLine, RenderModel};
    pub use crate::snapshot::{CartSnapshot, LineItem, MAX_QUANTITY_PER_ITEM};
}
