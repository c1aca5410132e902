//! Catalog and warehouse collaborator records.
//!
//! Products and warehouses are owned by out-of-scope collaborators; the
//! fulfillment pipeline only reads them to resolve SKUs and destinations.

use chrono::{DateTime, Utc};
use common::{ProductId, Sku, WarehouseId};
use serde::{Deserialize, Serialize};

/// A sellable product, identified by a unique SKU code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: Sku,
    pub name: String,
    /// Unit of measure, e.g. "piece" or "kg".
    pub uom: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product record.
    pub fn new(sku: impl Into<Sku>, name: impl Into<String>, uom: impl Into<String>) -> Self {
        Self {
            id: ProductId::new(),
            sku: sku.into(),
            name: name.into(),
            uom: uom.into(),
            created_at: Utc::now(),
        }
    }
}

/// A warehouse holding stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Warehouse {
    /// Creates a new warehouse record.
    pub fn new(name: impl Into<String>, location: Option<String>) -> Self {
        Self {
            id: WarehouseId::new(),
            name: name.into(),
            location,
            created_at: Utc::now(),
        }
    }
}
