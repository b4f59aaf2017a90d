//! Pure domain layer for the POS backend.
//!
//! Everything here is synchronous and storage-free: cart normalization,
//! payment methods, sale status transitions, server-side pricing, and the
//! store settings entity. The storage and checkout crates build on these
//! types.

pub mod cart;
pub mod error;
pub mod payment;
pub mod pricing;
pub mod sale;
pub mod settings;

pub use cart::{CartLine, normalize_lines};
pub use error::CartError;
pub use payment::PaymentMethod;
pub use pricing::{PricedLine, SaleDraft};
pub use sale::{RestockOnRefund, SaleStatus};
pub use settings::Settings;
