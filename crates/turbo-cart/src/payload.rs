//! Wire types exchanged with the authoritative store.
//!
//! Field names follow the storefront's JSON (`cart_items`, `id`, `price`)
//! and also accept the descriptive names used elsewhere in this crate.

use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};
use crate::snapshot::{CartSnapshot, LineItem};

/// A price as sent by the store: decimal text or a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WirePrice {
    Text(String),
    Number(serde_json::Number),
}

impl WirePrice {
    /// Parse into minor units of `currency`.
    pub fn to_money(&self, currency: Currency) -> Result<Money, CartError> {
        match self {
            Self::Text(text) => Money::parse_decimal(text, currency),
            Self::Number(number) => Money::parse_decimal(&number.to_string(), currency),
        }
    }
}

impl From<Money> for WirePrice {
    fn from(money: Money) -> Self {
        Self::Text(money.display_amount())
    }
}

/// One line of a full-cart response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCartItem {
    #[serde(alias = "id")]
    pub product_id: ProductId,
    pub name: String,
    #[serde(alias = "price")]
    pub unit_price: WirePrice,
    pub quantity: i64,
}

/// Full authoritative cart, as returned by a refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCartPayload {
    #[serde(alias = "cart_items", default)]
    pub items: Vec<ServerCartItem>,
    /// Store-computed total. Informational only; the subtotal is always recomputed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<WirePrice>,
}

/// Result of turning a payload into a snapshot.
#[derive(Debug, Clone)]
pub struct DecodedCart {
    pub snapshot: CartSnapshot,
    /// Lines skipped because their quantity was not positive.
    pub dropped: Vec<ProductId>,
    /// The store's own total, when it sent one.
    pub server_total: Option<Money>,
}

impl DecodedCart {
    /// True when the store's total disagrees with the recomputed subtotal.
    pub fn total_drift(&self) -> bool {
        self.server_total
            .is_some_and(|total| total != self.snapshot.subtotal())
    }
}

impl ServerCartPayload {
    /// Decode into a confirmed snapshot at `version`.
    ///
    /// Lines with quantity ≤ 0 are dropped; a negative or unparseable price
    /// rejects the whole payload.
    pub fn decode(&self, version: u64, currency: Currency) -> Result<DecodedCart, CartError> {
        let mut items = Vec::with_capacity(self.items.len());
        let mut dropped = Vec::new();

        for raw in &self.items {
            let unit_price = raw.unit_price.to_money(currency)?;
            if raw.quantity <= 0 {
                dropped.push(raw.product_id.clone());
                continue;
            }
            let quantity =
                u32::try_from(raw.quantity).map_err(|_| CartError::InvalidQuantity(raw.quantity))?;
            items.push(LineItem::new(
                raw.product_id.clone(),
                raw.name.clone(),
                unit_price,
                quantity,
            )?);
        }

        let server_total = self
            .total
            .as_ref()
            .map(|t| t.to_money(currency))
            .transpose()?;

        Ok(DecodedCart {
            snapshot: CartSnapshot::new(items, version, currency)?,
            dropped,
            server_total,
        })
    }

    /// Encode a snapshot the way the store would send it.
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        Self {
            items: snapshot
                .items()
                .iter()
                .map(|item| ServerCartItem {
                    product_id: item.product_id().clone(),
                    name: item.name().to_string(),
                    unit_price: item.unit_price().into(),
                    quantity: i64::from(item.quantity()),
                })
                .collect(),
            total: Some(snapshot.subtotal().into()),
        }
    }
}

/// Outcome reported by the store for a mutation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
    Error,
}

/// Acknowledgement of a mutation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMutationAck {
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServerMutationAck {
    pub fn success() -> Self {
        Self {
            status: AckStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AckStatus::Success
    }
}
