//! Row types and query filters for the storage layer.

use chrono::{DateTime, Utc};
use common::{CategoryId, CustomerId, EmployeeId, Money, ProductId, SaleId};
use domain::{PaymentMethod, SaleStatus};
use serde::{Deserialize, Serialize};

/// Whether a product is offered for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "Active",
            ProductStatus::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            _ => Err(format!("unknown product status: {s:?}")),
        }
    }
}

/// Whether an employee account may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Inactive => "Inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            _ => Err(format!("unknown account status: {s:?}")),
        }
    }
}

/// Employee role, from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Cashier,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Cashier => "Cashier",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cashier" => Ok(Role::Cashier),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {s:?}")),
        }
    }
}

/// A catalog product with its authoritative price and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub price: Money,
    pub stock_quantity: u32,
    pub status: ProductStatus,
}

impl ProductRecord {
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

/// An employee account (password material lives with the identity
/// provider, not here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub status: AccountStatus,
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A committed sale header, with display names joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Option<CustomerId>,
    /// None for walk-in sales.
    pub customer_name: Option<String>,
    pub cashier_id: EmployeeId,
    pub cashier_name: String,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
}

/// One line of a committed sale. Immutable after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineRecord {
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at the time of sale.
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A sale header together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleWithLines {
    pub sale: SaleRecord,
    pub lines: Vec<SaleLineRecord>,
}

/// Filters for sale listings. All fields combine with AND.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<SaleStatus>,
    pub limit: Option<u32>,
}

/// Filters for catalog listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    /// Only products with stock strictly below this threshold.
    pub low_stock_below: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        assert_eq!("Active".parse::<ProductStatus>().unwrap(), ProductStatus::Active);
        assert_eq!("inactive".parse::<ProductStatus>().unwrap(), ProductStatus::Inactive);
        assert!("Retired".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [Role::Cashier, Role::Manager, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("Owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_inactive_product_is_not_active() {
        let product = ProductRecord {
            id: ProductId::new(1),
            name: "Widget".to_string(),
            category_id: None,
            price: Money::from_cents(100),
            stock_quantity: 5,
            status: ProductStatus::Inactive,
        };
        assert!(!product.is_active());
    }
}
