//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Every failure is rendered as the `{success: false, error_kind,
/// message}` envelope; a failed commit never carries a sale id.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout taxonomy error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message, product_ids) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg, None),
            ApiError::Checkout(err) => {
                let status = match &err {
                    CheckoutError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    CheckoutError::InsufficientStock { .. } => StatusCode::CONFLICT,
                    CheckoutError::Unauthenticated => StatusCode::UNAUTHORIZED,
                    CheckoutError::Unauthorized => StatusCode::FORBIDDEN,
                    CheckoutError::Storage(e) => {
                        tracing::error!(error = %e, "storage failure surfaced to client");
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                let product_ids = match &err {
                    CheckoutError::InsufficientStock { product_ids } => {
                        Some(product_ids.clone())
                    }
                    _ => None,
                };
                (status, err.kind(), err.to_string(), product_ids)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    msg,
                    None,
                )
            }
        };

        let mut body = serde_json::json!({
            "success": false,
            "error_kind": kind,
            "message": message,
        });
        if let Some(ids) = product_ids {
            body["product_ids"] = serde_json::json!(ids);
        }
        (status, axum::Json(body)).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SaleNotFound(id) => ApiError::NotFound(format!("sale {id} not found")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
