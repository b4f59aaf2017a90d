use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, EmployeeId, ProductId, SaleId};
use domain::{RestockOnRefund, SaleDraft, SaleStatus};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::records::{
    CustomerRecord, EmployeeRecord, ProductFilter, ProductRecord, SaleFilter, SaleLineRecord,
    SaleRecord, SaleWithLines,
};
use crate::store::{DirectoryStore, InventoryStore, SaleLedger};
use crate::Result;

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, ProductRecord>,
    employees: HashMap<EmployeeId, EmployeeRecord>,
    customers: HashMap<CustomerId, CustomerRecord>,
    sales: BTreeMap<SaleId, SaleRecord>,
    sale_lines: HashMap<SaleId, Vec<SaleLineRecord>>,
    next_sale_id: i64,
}

/// In-memory store for tests and local development.
///
/// A single async mutex guards all state, so sale commits serialize and
/// the backend satisfies the same observable contract as the PostgreSQL
/// implementation: all-or-nothing commits, stock never negative.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product. Seed helper for tests and dev mode.
    pub async fn put_product(&self, product: ProductRecord) {
        self.inner.lock().await.products.insert(product.id, product);
    }

    /// Inserts or replaces an employee.
    pub async fn put_employee(&self, employee: EmployeeRecord) {
        self.inner
            .lock()
            .await
            .employees
            .insert(employee.id, employee);
    }

    /// Inserts or replaces a customer.
    pub async fn put_customer(&self, customer: CustomerRecord) {
        self.inner
            .lock()
            .await
            .customers
            .insert(customer.id, customer);
    }

    /// Returns the number of committed sales.
    pub async fn sale_count(&self) -> usize {
        self.inner.lock().await.sales.len()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.inner.lock().await.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductRecord>> {
        let inner = self.inner.lock().await;
        let mut products: Vec<ProductRecord> = inner
            .products
            .values()
            .filter(|p| {
                if let Some(category_id) = filter.category_id
                    && p.category_id != Some(category_id)
                {
                    return false;
                }
                if let Some(status) = filter.status
                    && p.status != status
                {
                    return false;
                }
                if let Some(ref search) = filter.search
                    && !p.name.to_lowercase().contains(&search.to_lowercase())
                {
                    return false;
                }
                if let Some(threshold) = filter.low_stock_below
                    && p.stock_quantity >= threshold
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn current_stock(&self, id: ProductId) -> Result<Option<u32>> {
        Ok(self
            .inner
            .lock()
            .await
            .products
            .get(&id)
            .map(|p| p.stock_quantity))
    }

    async fn try_decrement(&self, id: ProductId, quantity: u32) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.products.get_mut(&id) {
            Some(p) if p.stock_quantity >= quantity => {
                p.stock_quantity -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn employee(&self, id: EmployeeId) -> Result<Option<EmployeeRecord>> {
        Ok(self.inner.lock().await.employees.get(&id).cloned())
    }

    async fn customer(&self, id: CustomerId) -> Result<Option<CustomerRecord>> {
        Ok(self.inner.lock().await.customers.get(&id).cloned())
    }

    async fn list_customers(&self) -> Result<Vec<CustomerRecord>> {
        let inner = self.inner.lock().await;
        let mut customers: Vec<CustomerRecord> = inner.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }
}

#[async_trait]
impl SaleLedger for MemoryStore {
    async fn append_sale(&self, draft: &SaleDraft) -> Result<SaleId> {
        let mut inner = self.inner.lock().await;

        // Verify every line before mutating anything, so a failed commit
        // leaves no partial decrement behind.
        let short: Vec<ProductId> = draft
            .lines
            .iter()
            .filter(|line| {
                inner
                    .products
                    .get(&line.product_id)
                    .is_none_or(|p| p.stock_quantity < line.quantity)
            })
            .map(|line| line.product_id)
            .collect();
        if !short.is_empty() {
            return Err(StoreError::InsufficientStock { product_ids: short });
        }

        for line in &draft.lines {
            if let Some(p) = inner.products.get_mut(&line.product_id) {
                p.stock_quantity -= line.quantity;
            }
        }

        inner.next_sale_id += 1;
        let sale_id = SaleId::new(inner.next_sale_id);

        let customer_name = draft
            .customer_id
            .and_then(|id| inner.customers.get(&id))
            .map(|c| c.name.clone());
        let cashier_name = inner
            .employees
            .get(&draft.cashier_id)
            .map(|e| e.full_name.clone())
            .unwrap_or_default();

        let sale = SaleRecord {
            id: sale_id,
            sale_date: Utc::now(),
            customer_id: draft.customer_id,
            customer_name,
            cashier_id: draft.cashier_id,
            cashier_name,
            subtotal: draft.subtotal,
            tax: draft.tax,
            total: draft.total,
            payment_method: draft.payment_method,
            status: SaleStatus::Completed,
        };

        let lines: Vec<SaleLineRecord> = draft
            .lines
            .iter()
            .map(|line| SaleLineRecord {
                sale_id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            })
            .collect();

        inner.sales.insert(sale_id, sale);
        inner.sale_lines.insert(sale_id, lines);

        Ok(sale_id)
    }

    async fn set_status(
        &self,
        id: SaleId,
        status: SaleStatus,
        restock: RestockOnRefund,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let from = inner
            .sales
            .get(&id)
            .map(|s| s.status)
            .ok_or(StoreError::SaleNotFound(id))?;
        if !from.can_become(status) {
            return Err(StoreError::InvalidStatusChange { from, to: status });
        }

        if restock == RestockOnRefund::Restock {
            let lines = inner.sale_lines.get(&id).cloned().unwrap_or_default();
            for line in lines {
                if let Some(p) = inner.products.get_mut(&line.product_id) {
                    p.stock_quantity += line.quantity;
                }
            }
        }

        if let Some(sale) = inner.sales.get_mut(&id) {
            sale.status = status;
        }

        Ok(())
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleWithLines>> {
        let inner = self.inner.lock().await;
        Ok(inner.sales.get(&id).map(|sale| SaleWithLines {
            sale: sale.clone(),
            lines: inner.sale_lines.get(&id).cloned().unwrap_or_default(),
        }))
    }

    async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<SaleRecord>> {
        let inner = self.inner.lock().await;
        let mut sales: Vec<SaleRecord> = inner
            .sales
            .values()
            .filter(|s| {
                if let Some(start) = filter.start_date
                    && s.sale_date < start
                {
                    return false;
                }
                if let Some(end) = filter.end_date
                    && s.sale_date > end
                {
                    return false;
                }
                if let Some(method) = filter.payment_method
                    && s.payment_method != method
                {
                    return false;
                }
                if let Some(status) = filter.status
                    && s.status != status
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();
        // Newest first; ids are assigned in commit order.
        sales.sort_by(|a, b| b.id.cmp(&a.id));
        if let Some(limit) = filter.limit {
            sales.truncate(limit as usize);
        }
        Ok(sales)
    }
}
