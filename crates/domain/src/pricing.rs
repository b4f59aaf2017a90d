//! Server-side pricing of a validated cart.
//!
//! Client-supplied prices and totals are never trusted; the coordinator
//! builds `PricedLine`s from the catalog's authoritative prices and this
//! module derives the subtotal, tax, and total from them.

use common::{CustomerId, EmployeeId, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::payment::PaymentMethod;

/// A cart line priced from the catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    /// Product name captured at pricing time, for receipts.
    pub product_name: String,
    pub quantity: u32,
    /// Authoritative unit price at the time of sale.
    pub unit_price: Money,
    /// quantity x unit_price.
    pub subtotal: Money,
}

impl PricedLine {
    /// Prices a line, deriving its subtotal.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            subtotal: unit_price.multiply(quantity),
        }
    }
}

/// A fully validated and priced sale, ready for the ledger.
///
/// Invariant: `total == subtotal + tax` and `tax` is the configured rate
/// applied to `subtotal` with half-up rounding, all in integer cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub cashier_id: EmployeeId,
    pub customer_id: Option<CustomerId>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleDraft {
    /// Assembles a draft from priced lines, deriving subtotal, tax, and
    /// total at the given tax rate (basis points).
    pub fn price(
        cashier_id: EmployeeId,
        customer_id: Option<CustomerId>,
        payment_method: PaymentMethod,
        lines: Vec<PricedLine>,
        tax_rate_bps: u32,
    ) -> Self {
        let subtotal: Money = lines.iter().map(|l| l.subtotal).sum();
        let tax = subtotal.tax_at_bps(tax_rate_bps);
        Self {
            cashier_id,
            customer_id,
            payment_method,
            lines,
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(lines: Vec<PricedLine>, tax_rate_bps: u32) -> SaleDraft {
        SaleDraft::price(
            EmployeeId::new(1),
            None,
            PaymentMethod::Cash,
            lines,
            tax_rate_bps,
        )
    }

    #[test]
    fn test_priced_line_derives_subtotal() {
        let line = PricedLine::new(1, "Widget", 3, Money::from_cents(1000));
        assert_eq!(line.subtotal.cents(), 3000);
    }

    #[test]
    fn test_two_units_at_ten_dollars_with_ten_percent_tax() {
        // 2 x $10.00 at 10% tax -> $22.00 total
        let d = draft(
            vec![PricedLine::new(1, "Widget", 2, Money::from_cents(1000))],
            1000,
        );
        assert_eq!(d.subtotal.cents(), 2000);
        assert_eq!(d.tax.cents(), 200);
        assert_eq!(d.total.cents(), 2200);
    }

    #[test]
    fn test_total_is_subtotal_plus_tax_across_lines() {
        let d = draft(
            vec![
                PricedLine::new(1, "Widget", 2, Money::from_cents(1050)),
                PricedLine::new(2, "Gadget", 1, Money::from_cents(2599)),
            ],
            825, // 8.25%
        );
        assert_eq!(d.subtotal.cents(), 2100 + 2599);
        assert_eq!(d.total, d.subtotal + d.tax);
        // 8.25% of 4699 = 387.6675, rounds to 388
        assert_eq!(d.tax.cents(), 388);
    }

    #[test]
    fn test_tax_never_drifts_more_than_one_cent() {
        for subtotal in [1_i64, 15, 99, 999, 12_345, 1_000_001] {
            let d = draft(
                vec![PricedLine::new(1, "X", 1, Money::from_cents(subtotal))],
                1000,
            );
            let exact = subtotal as f64 * 0.10;
            let drift = (d.tax.cents() as f64 - exact).abs();
            assert!(drift <= 0.5, "subtotal {subtotal}: drift {drift}");
        }
    }

    #[test]
    fn test_zero_tax_rate() {
        let d = draft(
            vec![PricedLine::new(1, "Widget", 1, Money::from_cents(500))],
            0,
        );
        assert_eq!(d.tax, Money::zero());
        assert_eq!(d.total.cents(), 500);
    }

    #[test]
    fn test_walk_in_draft_has_no_customer() {
        let d = draft(vec![PricedLine::new(1, "W", 1, Money::from_cents(100))], 0);
        assert!(d.customer_id.is_none());
    }
}
