use std::pin::Pin;

use async_trait::async_trait;
use common::{CustomerId, EmployeeId, ProductId, SaleId};
use domain::{RestockOnRefund, SaleDraft, SaleStatus};
use futures_core::Stream;
use futures_util::stream;

use crate::records::{
    CustomerRecord, EmployeeRecord, ProductFilter, ProductRecord, SaleFilter, SaleRecord,
    SaleWithLines,
};
use crate::Result;

/// A stream of sale headers.
pub type SaleStream = Pin<Box<dyn Stream<Item = Result<SaleRecord>> + Send>>;

/// Inventory reads and the conditional-decrement primitive.
///
/// `current_stock` is advisory: callers may use it for display and
/// pre-checks, but the commit path re-verifies stock atomically inside the
/// ledger transaction.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Fetches a product's authoritative price/stock/status snapshot.
    async fn product(&self, id: ProductId) -> Result<Option<ProductRecord>>;

    /// Lists catalog products matching the filter, ordered by name.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductRecord>>;

    /// Reads the current stock quantity. Never the sole gate for a commit.
    async fn current_stock(&self, id: ProductId) -> Result<Option<u32>>;

    /// Atomically decrements stock by `quantity` only if the result stays
    /// non-negative. Returns false (and leaves stock unchanged) when the
    /// stock is insufficient or the product does not exist.
    async fn try_decrement(&self, id: ProductId, quantity: u32) -> Result<bool>;
}

/// Read-only employee and customer lookups.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn employee(&self, id: EmployeeId) -> Result<Option<EmployeeRecord>>;

    async fn customer(&self, id: CustomerId) -> Result<Option<CustomerRecord>>;

    /// Lists customers ordered by name, for the cart's customer selector.
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>>;
}

/// Durable, append-mostly record of sales and their lines.
#[async_trait]
pub trait SaleLedger: Send + Sync {
    /// Commits a priced sale: inserts the header and all lines and applies
    /// every conditional stock decrement inside one transaction. If any
    /// decrement fails the whole transaction is rolled back and
    /// `StoreError::InsufficientStock` names every offending product.
    ///
    /// Returns the new sale id, assigned by the store in commit order.
    async fn append_sale(&self, draft: &SaleDraft) -> Result<SaleId>;

    /// The only post-commit mutation: changes a sale's status. Enforces
    /// that `Completed -> Refunded` is the sole legal transition. With
    /// `RestockOnRefund::Restock`, the line quantities are returned to
    /// stock in the same transaction.
    async fn set_status(
        &self,
        id: SaleId,
        status: SaleStatus,
        restock: RestockOnRefund,
    ) -> Result<()>;

    /// Loads a sale header with its lines and joined display names.
    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleWithLines>>;

    /// Lists sale headers matching the filter, newest first.
    async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<SaleRecord>>;

    /// Streams sale headers matching the filter, for reporting folds.
    async fn stream_sales(&self, filter: &SaleFilter) -> Result<SaleStream> {
        let rows = self.list_sales(filter).await?;
        Ok(Box::pin(stream::iter(rows.into_iter().map(Ok))))
    }
}

/// The full storage surface the checkout coordinator and API depend on.
pub trait PosStore: InventoryStore + DirectoryStore + SaleLedger {}

impl<T: InventoryStore + DirectoryStore + SaleLedger> PosStore for T {}
