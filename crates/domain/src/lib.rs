//! Data model for the warehouse fulfillment system.
//!
//! This crate provides the core domain types:
//! - `OrderStatus` state machine and the `Order` aggregate with its items
//! - `Allocation` records linking orders to reserved stock
//! - `Stock` levels and the append-only `StockTransaction` movement log
//! - `LedgerEntry` audit records with their `OperationType`
//! - catalog/warehouse collaborator records (`Product`, `Warehouse`)

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod order;
pub mod status;
pub mod stock;

pub use catalog::{Product, Warehouse};
pub use error::{OrderError, ParseEnumError};
pub use ledger::{LedgerEntry, OperationType};
pub use order::{Allocation, Order, OrderItem};
pub use status::OrderStatus;
pub use stock::{Stock, StockTransaction};
