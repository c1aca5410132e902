pub mod types;

pub use types::{LedgerId, OrderId, ProductId, Sku, UserId, WarehouseId};
