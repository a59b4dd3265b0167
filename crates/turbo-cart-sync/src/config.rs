//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use turbo_cart::snapshot::MAX_QUANTITY_PER_ITEM;
use turbo_cart::Currency;

/// Configuration for a [`SyncEngine`](crate::SyncEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound on any single transport call.
    #[serde(rename = "transport_timeout_ms", with = "duration_ms")]
    pub transport_timeout: Duration,

    /// Currency the store prices in.
    pub currency: Currency,

    /// Cap applied to optimistic quantity increments and to `Add` validation.
    pub max_quantity_per_line: u32,
}

impl SyncConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transport timeout.
    pub fn with_transport_timeout(mut self, timeout: Duration) -> Self {
        self.transport_timeout = timeout;
        self
    }

    /// Set the currency.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Set the per-line quantity cap.
    pub fn with_max_quantity(mut self, max: u32) -> Self {
        self.max_quantity_per_line = max;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            transport_timeout: Duration::from_secs(10),
            currency: Currency::default(),
            max_quantity_per_line: MAX_QUANTITY_PER_ITEM,
        }
    }
}

/// Serialize a `Duration` as whole milliseconds.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
