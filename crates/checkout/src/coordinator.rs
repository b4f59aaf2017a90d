//! The sale coordinator: validation, pricing, and the atomic commit.

use common::{CustomerId, EmployeeId, Money, ProductId, SaleId};
use domain::{
    CartLine, PaymentMethod, PricedLine, RestockOnRefund, SaleDraft, SaleStatus, Settings,
    normalize_lines,
};
use serde::Serialize;
use store::{PosStore, Role};

use crate::error::CheckoutError;

/// A proposed sale, as assembled by the API layer.
///
/// The cashier id comes from the session principal, never from the request
/// body; the lines carry no prices.
#[derive(Debug, Clone)]
pub struct SaleRequest {
    pub cashier_id: EmployeeId,
    pub customer_id: Option<CustomerId>,
    /// Raw payment method string from the wire; validated here.
    pub payment_method: String,
    pub lines: Vec<CartLine>,
}

/// The durable outcome of a successful commit.
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub sale_id: SaleId,
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
}

/// Orchestrates sale commits and refunds against a storage backend.
///
/// The commit sequence is all-or-nothing: every failure before or during
/// the ledger transaction leaves no header, no lines, and no stock change.
pub struct SaleCoordinator<S> {
    store: S,
    settings: Settings,
}

impl<S> SaleCoordinator<S>
where
    S: PosStore,
{
    /// Creates a coordinator over the given backend and settings.
    pub fn new(store: S, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// The settings the coordinator prices with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Commits a proposed sale, returning the receipt or a taxonomy error.
    #[tracing::instrument(skip(self, request), fields(cashier = %request.cashier_id))]
    pub async fn commit_sale(&self, request: SaleRequest) -> Result<SaleReceipt, CheckoutError> {
        metrics::counter!("sale_commits_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.commit_inner(request).await;

        metrics::histogram!("sale_commit_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(receipt) => {
                metrics::counter!("sale_commits_completed").increment(1);
                tracing::info!(
                    sale_id = %receipt.sale_id,
                    total_cents = receipt.total.cents(),
                    "sale committed"
                );
            }
            Err(e) => {
                metrics::counter!("sale_commit_failures", "kind" => e.kind()).increment(1);
                tracing::warn!(kind = e.kind(), error = %e, "sale commit failed");
            }
        }

        result
    }

    async fn commit_inner(&self, request: SaleRequest) -> Result<SaleReceipt, CheckoutError> {
        let lines = normalize_lines(&request.lines)
            .map_err(|e| CheckoutError::InvalidInput(e.to_string()))?;
        let payment_method: PaymentMethod = request
            .payment_method
            .parse()
            .map_err(|e: domain::CartError| CheckoutError::InvalidInput(e.to_string()))?;

        match self.store.employee(request.cashier_id).await? {
            Some(cashier) if cashier.status.is_active() => {}
            _ => return Err(CheckoutError::Unauthenticated),
        }

        if let Some(customer_id) = request.customer_id
            && self.store.customer(customer_id).await?.is_none()
        {
            return Err(CheckoutError::InvalidInput(format!(
                "unknown customer {customer_id}"
            )));
        }

        // Advisory pre-check against the authoritative snapshot. The
        // conditional decrements inside append_sale are the enforcement
        // point; this pass exists to reject obvious shortfalls and price
        // the cart without touching any stock.
        let mut priced = Vec::with_capacity(lines.len());
        let mut short: Vec<ProductId> = Vec::new();
        for line in &lines {
            let product = self.store.product(line.product_id).await?.ok_or_else(|| {
                CheckoutError::InvalidInput(format!("unknown product {}", line.product_id))
            })?;
            if !product.is_active() {
                return Err(CheckoutError::InvalidInput(format!(
                    "product {} is inactive",
                    product.id
                )));
            }
            if line.quantity > product.stock_quantity {
                short.push(product.id);
                continue;
            }
            priced.push(PricedLine::new(
                product.id,
                product.name,
                line.quantity,
                product.price,
            ));
        }
        if !short.is_empty() {
            return Err(CheckoutError::InsufficientStock { product_ids: short });
        }

        let draft = SaleDraft::price(
            request.cashier_id,
            request.customer_id,
            payment_method,
            priced,
            self.settings.tax_rate_bps,
        );
        let sale_id = self.store.append_sale(&draft).await?;

        Ok(SaleReceipt {
            sale_id,
            lines: draft.lines,
            subtotal: draft.subtotal,
            tax: draft.tax,
            total: draft.total,
            payment_method,
        })
    }

    /// Marks a sale refunded. Cashiers may not refund; restocking is an
    /// explicit opt-in applied in the same transaction as the status
    /// change.
    #[tracing::instrument(skip(self))]
    pub async fn refund_sale(
        &self,
        sale_id: SaleId,
        actor: EmployeeId,
        restock: RestockOnRefund,
    ) -> Result<(), CheckoutError> {
        let employee = match self.store.employee(actor).await? {
            Some(e) if e.status.is_active() => e,
            _ => return Err(CheckoutError::Unauthenticated),
        };
        if employee.role == Role::Cashier {
            return Err(CheckoutError::Unauthorized);
        }

        self.store
            .set_status(sale_id, SaleStatus::Refunded, restock)
            .await?;

        metrics::counter!("sale_refunds_total").increment(1);
        tracing::info!(%sale_id, restocked = restock == RestockOnRefund::Restock, "sale refunded");
        Ok(())
    }
}
