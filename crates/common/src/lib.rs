pub mod types;

pub use types::{CategoryId, CustomerId, EmployeeId, Money, ProductId, SaleId};
