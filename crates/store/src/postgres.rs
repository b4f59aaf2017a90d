use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CategoryId, CustomerId, EmployeeId, Money, ProductId, SaleId};
use domain::{PaymentMethod, RestockOnRefund, SaleDraft, SaleStatus};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::StoreError;
use crate::records::{
    AccountStatus, CustomerRecord, EmployeeRecord, ProductFilter, ProductRecord, ProductStatus,
    Role, SaleFilter, SaleLineRecord, SaleRecord, SaleWithLines,
};
use crate::store::{DirectoryStore, InventoryStore, SaleLedger};
use crate::Result;

/// PostgreSQL-backed store.
///
/// The sale commit relies on the row locks taken by the conditional
/// decrement `UPDATE ... WHERE stock_quantity >= $n`: two commits touching
/// the same product serialize on that lock, and a commit that cannot
/// acquire it within `lock_timeout` rolls back and reports `LockTimeout`.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store with the default 5s lock timeout.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the per-transaction bound on row-lock waits.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        let stock: i64 = row.try_get("stock_quantity")?;
        Ok(ProductRecord {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            category_id: row
                .try_get::<Option<i64>, _>("category_id")?
                .map(CategoryId::new),
            price: Money::from_cents(row.try_get("price_cents")?),
            stock_quantity: u32::try_from(stock).map_err(|_| StoreError::InvalidColumn {
                column: "stock_quantity",
                value: stock.to_string(),
            })?,
            status: parse_column::<ProductStatus>("status", row.try_get("status")?)?,
        })
    }

    fn row_to_employee(row: PgRow) -> Result<EmployeeRecord> {
        Ok(EmployeeRecord {
            id: EmployeeId::new(row.try_get("id")?),
            username: row.try_get("username")?,
            full_name: row.try_get("full_name")?,
            role: parse_column::<Role>("role", row.try_get("role")?)?,
            status: parse_column::<AccountStatus>("status", row.try_get("status")?)?,
        })
    }

    fn row_to_customer(row: PgRow) -> Result<CustomerRecord> {
        Ok(CustomerRecord {
            id: CustomerId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
        })
    }

    fn row_to_sale(row: PgRow) -> Result<SaleRecord> {
        Ok(SaleRecord {
            id: SaleId::new(row.try_get("id")?),
            sale_date: row.try_get::<DateTime<Utc>, _>("sale_date")?,
            customer_id: row
                .try_get::<Option<i64>, _>("customer_id")?
                .map(CustomerId::new),
            customer_name: row.try_get("customer_name")?,
            cashier_id: EmployeeId::new(row.try_get("cashier_id")?),
            cashier_name: row.try_get("cashier_name")?,
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
            tax: Money::from_cents(row.try_get("tax_cents")?),
            total: Money::from_cents(row.try_get("total_cents")?),
            payment_method: parse_column::<PaymentMethod>(
                "payment_method",
                row.try_get("payment_method")?,
            )?,
            status: parse_column::<SaleStatus>("status", row.try_get("status")?)?,
        })
    }

    fn row_to_sale_line(row: PgRow) -> Result<SaleLineRecord> {
        let quantity: i64 = row.try_get("quantity")?;
        Ok(SaleLineRecord {
            sale_id: SaleId::new(row.try_get("sale_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: u32::try_from(quantity).map_err(|_| StoreError::InvalidColumn {
                column: "quantity",
                value: quantity.to_string(),
            })?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
        })
    }
}

const SALE_COLUMNS: &str = "\
    s.id, s.sale_date, s.customer_id, c.name AS customer_name, \
    s.cashier_id, e.full_name AS cashier_name, \
    s.subtotal_cents, s.tax_cents, s.total_cents, s.payment_method, s.status";

fn parse_column<T: FromStr>(column: &'static str, value: String) -> Result<T> {
    T::from_str(&value).map_err(|_| StoreError::InvalidColumn { column, value })
}

/// Translates a failed statement into the store taxonomy; SQLSTATE 55P03
/// is `lock_not_available`, raised when `lock_timeout` expires.
fn map_exec_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e
        && db.code().as_deref() == Some("55P03")
    {
        return StoreError::LockTimeout;
    }
    StoreError::Database(e)
}

#[async_trait]
impl InventoryStore for PostgresStore {
    async fn product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            "SELECT id, name, category_id, price_cents, stock_quantity, status \
             FROM products WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductRecord>> {
        let mut sql = String::from(
            "SELECT id, name, category_id, price_cents, stock_quantity, status \
             FROM products WHERE 1=1",
        );
        let mut param_count = 0;

        if filter.category_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category_id = ${param_count}"));
        }
        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if filter.search.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND name ILIKE ${param_count}"));
        }
        if filter.low_stock_below.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND stock_quantity < ${param_count}"));
        }
        sql.push_str(" ORDER BY name");

        let mut query = sqlx::query(&sql);
        if let Some(category_id) = filter.category_id {
            query = query.bind(category_id.get());
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(ref search) = filter.search {
            query = query.bind(format!("%{search}%"));
        }
        if let Some(threshold) = filter.low_stock_below {
            query = query.bind(threshold as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn current_stock(&self, id: ProductId) -> Result<Option<u32>> {
        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await?;

        stock
            .map(|s| {
                u32::try_from(s).map_err(|_| StoreError::InvalidColumn {
                    column: "stock_quantity",
                    value: s.to_string(),
                })
            })
            .transpose()
    }

    async fn try_decrement(&self, id: ProductId, quantity: u32) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity - $2 \
             WHERE id = $1 AND stock_quantity >= $2",
        )
        .bind(id.get())
        .bind(quantity as i64)
        .execute(&self.pool)
        .await
        .map_err(map_exec_err)?
        .rows_affected();

        Ok(updated > 0)
    }
}

#[async_trait]
impl DirectoryStore for PostgresStore {
    async fn employee(&self, id: EmployeeId) -> Result<Option<EmployeeRecord>> {
        let row = sqlx::query(
            "SELECT id, username, full_name, role, status FROM employees WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_employee).transpose()
    }

    async fn customer(&self, id: CustomerId) -> Result<Option<CustomerRecord>> {
        let row = sqlx::query("SELECT id, name, phone, email FROM customers WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn list_customers(&self) -> Result<Vec<CustomerRecord>> {
        let rows = sqlx::query("SELECT id, name, phone, email FROM customers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_customer).collect()
    }
}

#[async_trait]
impl SaleLedger for PostgresStore {
    async fn append_sale(&self, draft: &SaleDraft) -> Result<SaleId> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        // Decrements run first so every short line is known before
        // anything is written; a rollback then has nothing to undo.
        let mut short = Vec::new();
        for line in &draft.lines {
            let updated = sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity - $2 \
                 WHERE id = $1 AND stock_quantity >= $2",
            )
            .bind(line.product_id.get())
            .bind(line.quantity as i64)
            .execute(&mut *tx)
            .await
            .map_err(map_exec_err)?
            .rows_affected();

            if updated == 0 {
                short.push(line.product_id);
            }
        }
        if !short.is_empty() {
            tx.rollback().await?;
            tracing::debug!(?short, "sale commit aborted at conditional decrement");
            return Err(StoreError::InsufficientStock { product_ids: short });
        }

        let sale_id: i64 = sqlx::query_scalar(
            "INSERT INTO sales \
             (customer_id, cashier_id, subtotal_cents, tax_cents, total_cents, payment_method, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(draft.customer_id.map(|c| c.get()))
        .bind(draft.cashier_id.get())
        .bind(draft.subtotal.cents())
        .bind(draft.tax.cents())
        .bind(draft.total.cents())
        .bind(draft.payment_method.as_str())
        .bind(SaleStatus::Completed.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for line in &draft.lines {
            sqlx::query(
                "INSERT INTO sale_lines \
                 (sale_id, product_id, quantity, unit_price_cents, subtotal_cents) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(sale_id)
            .bind(line.product_id.get())
            .bind(line.quantity as i64)
            .bind(line.unit_price.cents())
            .bind(line.subtotal.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(sale_id, lines = draft.lines.len(), "sale committed");
        Ok(SaleId::new(sale_id))
    }

    async fn set_status(
        &self,
        id: SaleId,
        status: SaleStatus,
        restock: RestockOnRefund,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM sales WHERE id = $1 FOR UPDATE")
                .bind(id.get())
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_exec_err)?;

        let Some(current) = current else {
            return Err(StoreError::SaleNotFound(id));
        };
        let from = parse_column::<SaleStatus>("status", current)?;
        if !from.can_become(status) {
            return Err(StoreError::InvalidStatusChange { from, to: status });
        }

        sqlx::query("UPDATE sales SET status = $2 WHERE id = $1")
            .bind(id.get())
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        if restock == RestockOnRefund::Restock {
            sqlx::query(
                "UPDATE products p SET stock_quantity = p.stock_quantity + l.quantity \
                 FROM sale_lines l \
                 WHERE l.sale_id = $1 AND l.product_id = p.id",
            )
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(map_exec_err)?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleWithLines>> {
        let header = sqlx::query(&format!(
            "SELECT {SALE_COLUMNS} FROM sales s \
             LEFT JOIN customers c ON c.id = s.customer_id \
             JOIN employees e ON e.id = s.cashier_id \
             WHERE s.id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };
        let sale = Self::row_to_sale(header)?;

        let rows = sqlx::query(
            "SELECT l.sale_id, l.product_id, p.name AS product_name, \
                    l.quantity, l.unit_price_cents, l.subtotal_cents \
             FROM sale_lines l \
             JOIN products p ON p.id = l.product_id \
             WHERE l.sale_id = $1 \
             ORDER BY l.product_id",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(Self::row_to_sale_line)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(SaleWithLines { sale, lines }))
    }

    async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<SaleRecord>> {
        let mut sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales s \
             LEFT JOIN customers c ON c.id = s.customer_id \
             JOIN employees e ON e.id = s.cashier_id \
             WHERE 1=1"
        );
        let mut param_count = 0;

        if filter.start_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND s.sale_date >= ${param_count}"));
        }
        if filter.end_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND s.sale_date <= ${param_count}"));
        }
        if filter.payment_method.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND s.payment_method = ${param_count}"));
        }
        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND s.status = ${param_count}"));
        }

        sql.push_str(" ORDER BY s.sale_date DESC, s.id DESC");

        if filter.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut query = sqlx::query(&sql);
        if let Some(start) = filter.start_date {
            query = query.bind(start);
        }
        if let Some(end) = filter.end_date {
            query = query.bind(end);
        }
        if let Some(method) = filter.payment_method {
            query = query.bind(method.as_str());
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_sale).collect()
    }
}
