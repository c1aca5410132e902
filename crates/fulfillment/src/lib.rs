//! Order fulfillment engine.
//!
//! Drives orders through the `Placed -> Reserved -> Picked -> Shipped`
//! pipeline. Each transition is one unit of work against a
//! [`FulfillmentStore`](store::FulfillmentStore): the order row is locked,
//! the precondition status is checked, and every write commits or rolls
//! back together. Reserving goes through a [`ReservationGateway`]; shipping
//! is the only transition that touches stock, decrementing each allocated
//! SKU and appending a movement ledger row.

pub mod command;
pub mod engine;
pub mod error;
pub mod gateway;

pub use command::{CreateOrder, FulfillOrder, OrderLine, PickOrder, ReceiveStock, ShipOrder};
pub use engine::FulfillmentEngine;
pub use error::FulfillmentError;
pub use gateway::{
    FlakyGateway, GatewayError, HttpGateway, ReservationConfirmation, ReservationGateway,
    StubGateway,
};
