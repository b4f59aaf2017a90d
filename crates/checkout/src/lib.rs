//! Transaction coordinator for sale commits.
//!
//! Turns a proposed cart into a durable sale or rejects it with no partial
//! effects observable. This crate is the sole place where storage and
//! domain failures are translated into the caller-facing error taxonomy.

pub mod coordinator;
pub mod error;

pub use coordinator::{SaleCoordinator, SaleReceipt, SaleRequest};
pub use error::CheckoutError;
