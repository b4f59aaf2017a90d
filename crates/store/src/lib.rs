//! Storage layer for the POS backend.
//!
//! Two interchangeable backends implement the same traits: `PostgresStore`
//! for production and `MemoryStore` for tests and local development. The
//! sale-commit unit of work (header + lines + conditional stock
//! decrements) is atomic in both.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use common::{CategoryId, CustomerId, EmployeeId, Money, ProductId, SaleId};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    AccountStatus, CustomerRecord, EmployeeRecord, ProductFilter, ProductRecord, ProductStatus,
    Role, SaleFilter, SaleLineRecord, SaleRecord, SaleWithLines,
};
pub use store::{DirectoryStore, InventoryStore, PosStore, SaleLedger, SaleStream};
