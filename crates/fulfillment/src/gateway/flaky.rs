use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Sku, WarehouseId};

use super::{GatewayError, ReservationConfirmation, ReservationGateway};

#[derive(Debug, Default)]
struct FlakyState {
    fail_on_reserve: bool,
    declines: HashMap<String, String>,
    partial: HashMap<String, i64>,
    requests: Vec<(Sku, i64)>,
}

/// Configurable in-memory gateway for testing.
///
/// Can be told to fail outright, decline specific SKUs, or confirm partial
/// quantities, and records every reservation request it receives.
#[derive(Debug, Clone, Default)]
pub struct FlakyGateway {
    state: Arc<RwLock<FlakyState>>,
}

impl FlakyGateway {
    /// Creates a new gateway that confirms everything in full.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail every reserve call with a transport error.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reserve = fail;
    }

    /// Declines reservations for a SKU with the given reason.
    pub fn decline_sku(&self, sku: &Sku, reason: impl Into<String>) {
        self.state
            .write()
            .unwrap()
            .declines
            .insert(sku.as_str().to_string(), reason.into());
    }

    /// Caps confirmed quantities for a SKU, simulating a partial reservation.
    pub fn confirm_partial(&self, sku: &Sku, max_qty: i64) {
        self.state
            .write()
            .unwrap()
            .partial
            .insert(sku.as_str().to_string(), max_qty);
    }

    /// Returns the number of reserve calls received.
    pub fn request_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Returns all reservation requests received so far.
    pub fn requests(&self) -> Vec<(Sku, i64)> {
        self.state.read().unwrap().requests.clone()
    }
}

#[async_trait]
impl ReservationGateway for FlakyGateway {
    async fn reserve(
        &self,
        sku: &Sku,
        qty: i64,
        _warehouse_id: WarehouseId,
    ) -> Result<ReservationConfirmation, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.requests.push((sku.clone(), qty));

        if state.fail_on_reserve {
            return Err(GatewayError::Transport(
                "injected transport failure".to_string(),
            ));
        }

        if let Some(reason) = state.declines.get(sku.as_str()) {
            return Err(GatewayError::Declined {
                reason: reason.clone(),
            });
        }

        let reserved_qty = match state.partial.get(sku.as_str()) {
            Some(max) => qty.min(*max),
            None => qty,
        };

        Ok(ReservationConfirmation { reserved_qty })
    }
}
