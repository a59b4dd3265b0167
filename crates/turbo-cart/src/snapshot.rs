//! Immutable cart snapshots and their line items.

use serde::Serialize;

use crate::error::CartError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};
use crate::operation::{Mutation, QuantityDelta};

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: u32 = 9999;

/// One product line. Quantity is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    product_id: ProductId,
    name: String,
    unit_price: Money,
    quantity: u32,
}

impl LineItem {
    /// Create a line, rejecting a zero quantity or a negative price.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, CartError> {
        let product_id = product_id.into();
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }
        if unit_price.is_negative() {
            return Err(CartError::NegativePrice {
                product_id: product_id.to_string(),
                amount_cents: unit_price.amount_cents,
            });
        }
        Ok(Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity,
        })
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`, or None on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.try_multiply(i64::from(self.quantity))
    }
}

/// Point-in-time cart state.
///
/// Confirmed snapshots are built from authoritative responses and carry a
/// version that grows by one per accepted response. Optimistic snapshots keep
/// the version of the confirmed snapshot they were derived from. The
/// subtotal is never stored; it is recomputed from the lines on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    items: Vec<LineItem>,
    version: u64,
    currency: Currency,
}

impl CartSnapshot {
    /// The empty cart at version 0.
    pub fn empty(currency: Currency) -> Self {
        Self {
            items: Vec::new(),
            version: 0,
            currency,
        }
    }

    /// Build a snapshot from lines in insertion order.
    ///
    /// Repeated product ids are folded into the first occurrence. Fails if a
    /// line is priced in another currency or the subtotal overflows.
    pub fn new(items: Vec<LineItem>, version: u64, currency: Currency) -> Result<Self, CartError> {
        let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
        for item in items {
            if item.unit_price.currency != currency {
                return Err(CartError::CurrencyMismatch {
                    expected: currency.code().to_string(),
                    got: item.unit_price.currency.code().to_string(),
                });
            }
            match merged.iter_mut().find(|m| m.product_id == item.product_id) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(item.quantity)
                        .ok_or(CartError::Overflow)?;
                }
                None => merged.push(item),
            }
        }

        let snapshot = Self {
            items: merged,
            version,
            currency,
        };
        snapshot.checked_subtotal().ok_or(CartError::Overflow)?;
        Ok(snapshot)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Find the line for a product.
    pub fn line(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Σ unit_price × quantity, or None on overflow.
    pub fn checked_subtotal(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::zero(self.currency), |acc, item| {
            acc.try_add(&item.line_total()?)
        })
    }

    /// Σ unit_price × quantity, saturating at the largest representable amount.
    pub fn subtotal(&self) -> Money {
        self.checked_subtotal()
            .unwrap_or_else(|| Money::new(i64::MAX, self.currency))
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compare lines only, ignoring version.
    pub fn same_contents(&self, other: &CartSnapshot) -> bool {
        self.currency == other.currency && self.items == other.items
    }

    /// Locally predicted result of `mutation`, at the same version.
    ///
    /// Quantities are capped at `max_quantity`. An `Add` of an absent product
    /// creates a line only when the mutation carries a listing.
    pub fn apply_optimistic(&self, mutation: &Mutation, max_quantity: u32) -> CartSnapshot {
        let mut items = self.items.clone();
        let position = items
            .iter()
            .position(|i| &i.product_id == mutation.product_id());

        match (mutation, position) {
            (Mutation::Add { quantity, .. }, Some(idx)) => {
                let line = &mut items[idx];
                line.quantity = line.quantity.saturating_add(*quantity).min(max_quantity);
            }
            (
                Mutation::Add {
                    product_id,
                    quantity,
                    listing: Some(listing),
                },
                None,
            ) if *quantity > 0 && listing.unit_price.currency == self.currency => {
                items.push(LineItem {
                    product_id: product_id.clone(),
                    name: listing.name.clone(),
                    unit_price: listing.unit_price,
                    quantity: (*quantity).min(max_quantity),
                });
            }
            (Mutation::Remove { .. }, Some(idx)) => {
                items.remove(idx);
            }
            (Mutation::SetQuantity { delta, .. }, Some(idx)) => match delta {
                QuantityDelta::Increase => {
                    let line = &mut items[idx];
                    line.quantity = line.quantity.saturating_add(1).min(max_quantity);
                }
                QuantityDelta::Decrease if items[idx].quantity <= 1 => {
                    items.remove(idx);
                }
                QuantityDelta::Decrease => items[idx].quantity -= 1,
            },
            _ => {}
        }

        CartSnapshot {
            items,
            version: self.version,
            currency: self.currency,
        }
    }
}
