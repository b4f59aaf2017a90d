//! The caller-facing failure taxonomy.

use common::ProductId;
use store::StoreError;
use thiserror::Error;

/// Every way a checkout operation can fail, as surfaced to callers.
///
/// The coordinator is the only place `StoreError` crosses into this type,
/// so nothing below it can leak a half-applied commit or an untranslated
/// failure.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Malformed or unresolvable input: empty cart, zero quantity, unknown
    /// payment method, unknown or inactive product, unknown customer, or
    /// an illegal refund transition. Rejected before any storage mutation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// One or more lines exceed available stock, either at the advisory
    /// pre-check or at the conditional decrement inside the commit
    /// transaction. Nothing was written.
    #[error("insufficient stock for product(s) {product_ids:?}")]
    InsufficientStock { product_ids: Vec<ProductId> },

    /// The acting employee is unknown or inactive.
    #[error("not authenticated")]
    Unauthenticated,

    /// The acting employee's role does not permit the operation.
    #[error("not authorized")]
    Unauthorized,

    /// The storage transaction failed (lock timeout, connectivity, or
    /// constraint trouble). Fully rolled back; safe to retry with the same
    /// cart.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl CheckoutError {
    /// Stable machine-readable kind, used in responses and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckoutError::InvalidInput(_) => "invalid_input",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::Unauthenticated => "unauthenticated",
            CheckoutError::Unauthorized => "unauthorized",
            CheckoutError::Storage(_) => "storage_error",
        }
    }
}

impl From<StoreError> for CheckoutError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InsufficientStock { product_ids } => {
                CheckoutError::InsufficientStock { product_ids }
            }
            StoreError::SaleNotFound(id) => {
                CheckoutError::InvalidInput(format!("sale {id} not found"))
            }
            StoreError::InvalidStatusChange { from, to } => {
                CheckoutError::InvalidInput(format!("illegal status change: {from} -> {to}"))
            }
            other => CheckoutError::Storage(other),
        }
    }
}
