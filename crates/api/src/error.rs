//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::FulfillmentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Fulfillment engine error.
    Fulfillment(FulfillmentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    match &err {
        FulfillmentError::Validation(_)
        | FulfillmentError::UnknownSku(_)
        | FulfillmentError::UnknownWarehouse(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        FulfillmentError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        FulfillmentError::InvalidTransition { .. }
        | FulfillmentError::ReservationFailed { .. }
        | FulfillmentError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        FulfillmentError::Store(store_err) => {
            tracing::error!(error = %store_err, "store error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<store::StoreError> for ApiError {
    fn from(err: store::StoreError) -> Self {
        ApiError::Fulfillment(FulfillmentError::Store(err))
    }
}
