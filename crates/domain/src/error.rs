//! Domain validation errors.

use common::ProductId;
use thiserror::Error;

/// Errors raised while normalizing or pricing a proposed cart.
///
/// The checkout coordinator translates these into its `InvalidInput`
/// failure kind; nothing here touches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The cart contained no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A line requested a zero quantity.
    #[error("quantity for product {0} must be positive")]
    ZeroQuantity(ProductId),

    /// Merging duplicate lines overflowed the quantity range.
    #[error("combined quantity for product {0} is out of range")]
    QuantityOutOfRange(ProductId),

    /// The payment method string was not recognized.
    #[error("unknown payment method: {0:?}")]
    UnknownPaymentMethod(String),
}
