//! Payment method enumeration.

use serde::{Deserialize, Serialize};

use crate::error::CartError;

/// How a sale was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    DigitalWallet,
}

impl PaymentMethod {
    /// All supported payment methods, in display order.
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::DigitalWallet,
    ];

    /// Returns the wire/storage name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::DigitalWallet => "digital_wallet",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Tolerate the hyphenated spelling some clients send.
        match s.to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "digital_wallet" | "digital-wallet" => Ok(PaymentMethod::DigitalWallet),
            _ => Err(CartError::UnknownPaymentMethod(s.to_string())),
        }
    }
}
