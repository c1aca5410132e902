//! Order status state machine.

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// The status of an order in the fulfillment pipeline.
///
/// Transitions are strictly linear:
/// ```text
/// Placed ──► Reserved ──► Picked ──► Shipped
/// ```
/// No transition may be applied twice or skipped, and there is no
/// cancellation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order has been created with its items; no stock touched yet.
    #[default]
    Placed,

    /// Every line has a confirmed allocation from the reservation gateway.
    Reserved,

    /// Goods have been picked in the warehouse; awaiting shipment.
    Picked,

    /// Stock has been decremented and ledgered (terminal state).
    Shipped,
}

impl OrderStatus {
    /// Returns true if the order can move to `Reserved` from this status.
    pub fn can_reserve(&self) -> bool {
        matches!(self, OrderStatus::Placed)
    }

    /// Returns true if the order can move to `Picked` from this status.
    pub fn can_pick(&self) -> bool {
        matches!(self, OrderStatus::Reserved)
    }

    /// Returns true if the order can move to `Shipped` from this status.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Picked)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Shipped)
    }

    /// Returns the next status in the pipeline, or None from the terminal state.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Placed => Some(OrderStatus::Reserved),
            OrderStatus::Reserved => Some(OrderStatus::Picked),
            OrderStatus::Picked => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => None,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "Placed",
            OrderStatus::Reserved => "Reserved",
            OrderStatus::Picked => "Picked",
            OrderStatus::Shipped => "Shipped",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Placed" => Ok(OrderStatus::Placed),
            "Reserved" => Ok(OrderStatus::Reserved),
            "Picked" => Ok(OrderStatus::Picked),
            "Shipped" => Ok(OrderStatus::Shipped),
            other => Err(ParseEnumError {
                kind: "OrderStatus",
                value: other.to_string(),
            }),
        }
    }
}
