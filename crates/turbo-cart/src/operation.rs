//! Cart mutations and the operations that carry them through the queue.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CartError;
use crate::ids::{ProductId, RequestId};
use crate::money::Money;

/// Direction of a single-step quantity adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityDelta {
    /// +1.
    Increase,
    /// -1. Decrementing a quantity of 1 removes the line.
    Decrease,
}

impl QuantityDelta {
    /// Signed step applied to the quantity.
    pub fn step(&self) -> i64 {
        match self {
            Self::Increase => 1,
            Self::Decrease => -1,
        }
    }

    /// Action name understood by the storefront's update endpoint.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

/// Display data the UI already holds for a product card.
///
/// Lets the optimistic view show a new line before the store confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListing {
    pub name: String,
    pub unit_price: Money,
}

impl ProductListing {
    pub fn new(name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            name: name.into(),
            unit_price,
        }
    }
}

/// A change requested against the authoritative cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// Add `quantity` units, creating the line if needed.
    Add {
        product_id: ProductId,
        quantity: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        listing: Option<ProductListing>,
    },
    /// Delete the line. Removing an absent product is a no-op.
    Remove { product_id: ProductId },
    /// Adjust the quantity by one step.
    SetQuantity {
        product_id: ProductId,
        delta: QuantityDelta,
    },
}

impl Mutation {
    /// Add a single unit.
    pub fn add(product_id: impl Into<ProductId>) -> Self {
        Self::add_quantity(product_id, 1)
    }

    /// Add an explicit number of units.
    pub fn add_quantity(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self::Add {
            product_id: product_id.into(),
            quantity,
            listing: None,
        }
    }

    /// Attach a listing to an `Add`. Other mutations are returned unchanged.
    pub fn with_listing(self, listing: ProductListing) -> Self {
        match self {
            Self::Add {
                product_id,
                quantity,
                ..
            } => Self::Add {
                product_id,
                quantity,
                listing: Some(listing),
            },
            other => other,
        }
    }

    pub fn remove(product_id: impl Into<ProductId>) -> Self {
        Self::Remove {
            product_id: product_id.into(),
        }
    }

    pub fn increase(product_id: impl Into<ProductId>) -> Self {
        Self::SetQuantity {
            product_id: product_id.into(),
            delta: QuantityDelta::Increase,
        }
    }

    pub fn decrease(product_id: impl Into<ProductId>) -> Self {
        Self::SetQuantity {
            product_id: product_id.into(),
            delta: QuantityDelta::Decrease,
        }
    }

    /// The product this mutation targets.
    pub fn product_id(&self) -> &ProductId {
        match self {
            Self::Add { product_id, .. }
            | Self::Remove { product_id }
            | Self::SetQuantity { product_id, .. } => product_id,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::SetQuantity {
                delta: QuantityDelta::Increase,
                ..
            } => "increase",
            Self::SetQuantity {
                delta: QuantityDelta::Decrease,
                ..
            } => "decrease",
        }
    }

    /// Reject mutations no store could accept.
    pub fn validate(&self, max_quantity: u32) -> Result<(), CartError> {
        match self {
            Self::Add { quantity: 0, .. } => Err(CartError::InvalidQuantity(0)),
            Self::Add { quantity, .. } if *quantity > max_quantity => Err(
                CartError::QuantityExceedsLimit(u64::from(*quantity), max_quantity),
            ),
            Self::Add {
                product_id,
                listing: Some(listing),
                ..
            } if listing.unit_price.is_negative() => Err(CartError::NegativePrice {
                product_id: product_id.to_string(),
                amount_cents: listing.unit_price.amount_cents,
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add {
                product_id,
                quantity,
                ..
            } => write!(f, "add {} x{}", product_id, quantity),
            _ => write!(f, "{} {}", self.kind(), self.product_id()),
        }
    }
}

/// A mutation stamped with its request id. Owned by the queue until it completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub request_id: RequestId,
    pub mutation: Mutation,
}

impl Operation {
    pub fn new(request_id: RequestId, mutation: Mutation) -> Self {
        Self {
            request_id,
            mutation,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.mutation, self.request_id)
    }
}
