//! Wire-level cart lines and their normalization.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::CartError;

/// One line of a proposed cart as submitted by the client.
///
/// Carries no price: the server re-prices every line from the catalog at
/// commit time, so a client cannot influence what it is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Normalizes a submitted cart: merges duplicate product lines by summing
/// their quantities (preserving first-seen order) and rejects empty carts
/// and zero quantities.
///
/// Negative quantities cannot be represented at this layer; they are
/// rejected during deserialization of the request body.
pub fn normalize_lines(lines: &[CartLine]) -> Result<Vec<CartLine>, CartError> {
    if lines.is_empty() {
        return Err(CartError::EmptyCart);
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(CartError::ZeroQuantity(line.product_id));
        }
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or(CartError::QuantityOutOfRange(line.product_id))?;
            }
            None => merged.push(*line),
        }
    }

    Ok(merged)
}
