//! Reservation gateway trait and its implementations.
//!
//! Reserving stock for an order line goes through an external warehouse
//! system. The outcome is a tagged result: a confirmation carrying the
//! quantity actually reserved, or a [`GatewayError`] separating a business
//! decline from transport failures and timeouts. The engine treats every
//! error the same way (abort the transition); the distinction is kept for
//! callers and logs.

mod flaky;
mod http;
mod stub;

use async_trait::async_trait;
use common::{Sku, WarehouseId};
use thiserror::Error;

pub use flaky::FlakyGateway;
pub use http::HttpGateway;
pub use stub::StubGateway;

/// A confirmed reservation for one order line.
///
/// `reserved_qty` may be less than requested when the warehouse confirms a
/// partial quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationConfirmation {
    pub reserved_qty: i64,
}

/// Why a reservation did not happen.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The warehouse system refused the reservation.
    #[error("declined: {reason}")]
    Declined { reason: String },

    /// The gateway could not be reached or answered unintelligibly.
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway did not answer within the configured deadline.
    #[error("timed out")]
    Timeout,
}

/// External reservation system for warehouse stock.
#[async_trait]
pub trait ReservationGateway: Send + Sync {
    /// Reserves `qty` units of `sku` at the given warehouse.
    async fn reserve(
        &self,
        sku: &Sku,
        qty: i64,
        warehouse_id: WarehouseId,
    ) -> Result<ReservationConfirmation, GatewayError>;
}
