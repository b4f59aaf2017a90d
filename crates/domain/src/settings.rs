//! Store configuration entity.
//!
//! An explicit value with defined defaults, constructed once at boot and
//! handed to the coordinator; deliberately not tied to any session.

use serde::{Deserialize, Serialize};

/// Store, receipt, and tax configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub store_name: String,
    pub store_address: String,
    pub store_phone: String,
    /// ISO 4217 currency code used for display.
    pub currency: String,
    pub receipt_header: String,
    pub receipt_footer: String,
    /// Sales tax rate in basis points (1000 = 10%).
    pub tax_rate_bps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_name: "Corner Market".to_string(),
            store_address: "123 Main Street".to_string(),
            store_phone: "+1 (555) 123-4567".to_string(),
            currency: "USD".to_string(),
            receipt_header: "Thank you for shopping with us!".to_string(),
            receipt_footer: "Please come again!".to_string(),
            tax_rate_bps: 1000,
        }
    }
}
