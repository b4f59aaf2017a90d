use common::{ProductId, SaleId};
use domain::SaleStatus;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// One or more conditional stock decrements failed during a sale
    /// commit. The whole transaction was rolled back; `product_ids` names
    /// every line whose stock was insufficient (or whose product row no
    /// longer exists).
    #[error("insufficient stock for product(s) {product_ids:?}")]
    InsufficientStock { product_ids: Vec<ProductId> },

    /// The referenced sale does not exist.
    #[error("sale not found: {0}")]
    SaleNotFound(SaleId),

    /// The requested status change is not a legal transition.
    #[error("illegal sale status change: {from} -> {to}")]
    InvalidStatusChange { from: SaleStatus, to: SaleStatus },

    /// A row lock could not be acquired within the configured bound.
    /// The transaction was rolled back; the operation is retryable.
    #[error("lock wait timed out")]
    LockTimeout,

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded into its domain type.
    #[error("invalid {column} value in storage: {value:?}")]
    InvalidColumn {
        column: &'static str,
        value: String,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
