//! Stock levels and the append-only movement log.

use chrono::{DateTime, Utc};
use common::Sku;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current stock level for one SKU.
///
/// One row per SKU. Mutated only through ledger-backed store operations;
/// `total_qty` never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub sku: Sku,
    pub total_qty: i64,
    pub reserved_qty: i64,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    /// Creates an empty stock row for a SKU.
    pub fn empty(sku: Sku) -> Self {
        Self {
            sku,
            total_qty: 0,
            reserved_qty: 0,
            updated_at: Utc::now(),
        }
    }

    /// Quantity not yet committed to a reservation.
    pub fn available(&self) -> i64 {
        self.total_qty - self.reserved_qty
    }
}

/// Immutable record of one signed stock quantity change.
///
/// Appended on every mutation of a stock row; the level can in principle be
/// reconstructed by summing deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: Uuid,
    pub sku: Sku,
    pub delta: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    /// Creates a movement record for a SKU.
    pub fn new(sku: Sku, delta: i64, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sku,
            delta,
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }
}
