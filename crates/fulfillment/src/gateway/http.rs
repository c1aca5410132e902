use std::time::Duration;

use async_trait::async_trait;
use common::{Sku, WarehouseId};
use serde::{Deserialize, Serialize};

use super::{GatewayError, ReservationConfirmation, ReservationGateway};

#[derive(Debug, Serialize)]
struct ReserveRequest<'a> {
    sku: &'a str,
    qty: i64,
    warehouse_id: WarehouseId,
}

#[derive(Debug, Deserialize)]
struct ReserveResponse {
    success: bool,
    reserved_qty: Option<i64>,
    reason: Option<String>,
}

/// Gateway that POSTs reservation requests to an HTTP endpoint.
///
/// The request body is `{"sku", "qty", "warehouse_id"}` and the expected
/// answer is `{"success", "reserved_qty", "reason"}`. Every request is
/// bounded by the configured timeout; transport failures and timeouts are
/// reported as errors, never as confirmations.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGateway {
    /// Creates a gateway for the given endpoint with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ReservationGateway for HttpGateway {
    async fn reserve(
        &self,
        sku: &Sku,
        qty: i64,
        warehouse_id: WarehouseId,
    ) -> Result<ReservationConfirmation, GatewayError> {
        let body = ReserveRequest {
            sku: sku.as_str(),
            qty,
            warehouse_id,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "gateway returned HTTP {status}"
            )));
        }

        let answer: ReserveResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if answer.success {
            Ok(ReservationConfirmation {
                reserved_qty: answer.reserved_qty.unwrap_or(qty),
            })
        } else {
            Err(GatewayError::Declined {
                reason: answer
                    .reason
                    .unwrap_or_else(|| "reservation declined".to_string()),
            })
        }
    }
}
