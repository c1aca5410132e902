use async_trait::async_trait;
use common::{Sku, WarehouseId};

use super::{GatewayError, ReservationConfirmation, ReservationGateway};

/// Gateway that confirms every reservation in full.
///
/// Used when no reservation endpoint is configured. It makes no durable
/// reservation anywhere, so sufficiency is only enforced later, at ship
/// time, against actual stock.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubGateway;

impl StubGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReservationGateway for StubGateway {
    async fn reserve(
        &self,
        _sku: &Sku,
        qty: i64,
        _warehouse_id: WarehouseId,
    ) -> Result<ReservationConfirmation, GatewayError> {
        Ok(ReservationConfirmation { reserved_qty: qty })
    }
}
