//! Sale status and refund policy types.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a committed sale.
///
/// A sale is created `Completed` and the only legal transition afterwards
/// is `Completed -> Refunded`. Sales are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SaleStatus {
    #[default]
    Completed,
    Refunded,
}

impl SaleStatus {
    /// Returns the storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "Completed",
            SaleStatus::Refunded => "Refunded",
        }
    }

    /// Returns true if this status may transition to `to`.
    pub fn can_become(&self, to: SaleStatus) -> bool {
        matches!((self, to), (SaleStatus::Completed, SaleStatus::Refunded))
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "completed" => Ok(SaleStatus::Completed),
            "refunded" => Ok(SaleStatus::Refunded),
            _ => Err(format!("unknown sale status: {s:?}")),
        }
    }
}

/// Whether marking a sale refunded also returns its quantities to stock.
///
/// Status-only is the default; restocking must be requested explicitly by
/// the caller and happens in the same storage transaction as the status
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestockOnRefund {
    #[default]
    StatusOnly,
    Restock,
}
