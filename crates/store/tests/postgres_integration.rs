//! PostgreSQL integration tests.
//!
//! These tests share one PostgreSQL container and run serially so each
//! starts from truncated tables:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use common::{CustomerId, EmployeeId, Money, ProductId, SaleId};
use domain::{PaymentMethod, PricedLine, RestockOnRefund, SaleDraft, SaleStatus};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    DirectoryStore, InventoryStore, PostgresStore, SaleFilter, SaleLedger, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/0001_pos_schema.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared, re-seeded tables.
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::raw_sql(
        "TRUNCATE TABLE sale_lines, sales, products, customers, employees RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::raw_sql(
        "INSERT INTO employees (username, full_name, role, status) VALUES \
            ('jane', 'Jane Smith', 'Cashier', 'Active'), \
            ('mike', 'Mike Wilson', 'Admin', 'Active'); \
         INSERT INTO customers (name, phone) VALUES ('Alice Johnson', '555-0100'); \
         INSERT INTO products (name, price_cents, stock_quantity, status) VALUES \
            ('Widget', 1000, 5, 'Active'), \
            ('Gadget', 2500, 3, 'Active'), \
            ('Relic', 9900, 0, 'Inactive')",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

const WIDGET: ProductId = ProductId::new(1);
const GADGET: ProductId = ProductId::new(2);

fn cash_draft(lines: Vec<PricedLine>) -> SaleDraft {
    SaleDraft::price(EmployeeId::new(1), None, PaymentMethod::Cash, lines, 1000)
}

fn widget_line(quantity: u32) -> PricedLine {
    PricedLine::new(WIDGET, "Widget", quantity, Money::from_cents(1000))
}

#[tokio::test]
#[serial]
async fn commit_writes_header_lines_and_decrements_stock() {
    let store = get_test_store().await;

    let draft = SaleDraft::price(
        EmployeeId::new(1),
        Some(CustomerId::new(1)),
        PaymentMethod::Card,
        vec![
            widget_line(2),
            PricedLine::new(GADGET, "Gadget", 1, Money::from_cents(2500)),
        ],
        1000,
    );
    let sale_id = store.append_sale(&draft).await.unwrap();

    let sale = store.get_sale(sale_id).await.unwrap().unwrap();
    assert_eq!(sale.sale.status, SaleStatus::Completed);
    assert_eq!(sale.sale.cashier_name, "Jane Smith");
    assert_eq!(sale.sale.customer_name.as_deref(), Some("Alice Johnson"));
    assert_eq!(sale.sale.subtotal.cents(), 4500);
    assert_eq!(sale.sale.total.cents(), 4950);
    assert_eq!(sale.lines.len(), 2);

    assert_eq!(store.current_stock(WIDGET).await.unwrap(), Some(3));
    assert_eq!(store.current_stock(GADGET).await.unwrap(), Some(2));
}

#[tokio::test]
#[serial]
async fn sale_ids_are_assigned_in_commit_order() {
    let store = get_test_store().await;

    let first = store.append_sale(&cash_draft(vec![widget_line(1)])).await.unwrap();
    let second = store.append_sale(&cash_draft(vec![widget_line(1)])).await.unwrap();

    assert!(first < second);
}

#[tokio::test]
#[serial]
async fn failed_commit_rolls_back_everything() {
    let store = get_test_store().await;

    // Widget fits, Gadget does not: the whole commit must vanish.
    let err = store
        .append_sale(&cash_draft(vec![
            widget_line(2),
            PricedLine::new(GADGET, "Gadget", 10, Money::from_cents(2500)),
        ]))
        .await
        .unwrap_err();

    match err {
        StoreError::InsufficientStock { product_ids } => {
            assert_eq!(product_ids, vec![GADGET]);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(store.current_stock(WIDGET).await.unwrap(), Some(5));
    assert_eq!(store.current_stock(GADGET).await.unwrap(), Some(3));

    let sale_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(store.pool())
        .await
        .unwrap();
    let line_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_lines")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(sale_count, 0);
    assert_eq!(line_count, 0);
}

#[tokio::test]
#[serial]
async fn concurrent_commits_over_same_product_never_oversell() {
    let store = get_test_store().await; // stock(Widget) = 5

    let commit = |store: PostgresStore| async move {
        store.append_sale(&cash_draft(vec![widget_line(3)])).await
    };

    let (a, b) = tokio::join!(commit(store.clone()), commit(store.clone()));

    let succeeded = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1, "exactly one of the racing commits fits");
    let failed = if a.is_err() { a } else { b };
    assert!(matches!(
        failed.unwrap_err(),
        StoreError::InsufficientStock { .. }
    ));

    assert_eq!(store.current_stock(WIDGET).await.unwrap(), Some(2));
}

#[tokio::test]
#[serial]
async fn try_decrement_is_conditional() {
    let store = get_test_store().await;

    assert!(store.try_decrement(WIDGET, 5).await.unwrap());
    assert!(!store.try_decrement(WIDGET, 1).await.unwrap());
    assert_eq!(store.current_stock(WIDGET).await.unwrap(), Some(0));
    assert!(!store.try_decrement(ProductId::new(99), 1).await.unwrap());
}

#[tokio::test]
#[serial]
async fn refund_is_status_only_unless_restock_requested() {
    let store = get_test_store().await;

    let sale_id = store.append_sale(&cash_draft(vec![widget_line(2)])).await.unwrap();
    assert_eq!(store.current_stock(WIDGET).await.unwrap(), Some(3));

    store
        .set_status(sale_id, SaleStatus::Refunded, RestockOnRefund::StatusOnly)
        .await
        .unwrap();
    let sale = store.get_sale(sale_id).await.unwrap().unwrap();
    assert_eq!(sale.sale.status, SaleStatus::Refunded);
    assert_eq!(store.current_stock(WIDGET).await.unwrap(), Some(3));

    // A second refund is rejected, restock or not.
    let err = store
        .set_status(sale_id, SaleStatus::Refunded, RestockOnRefund::Restock)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidStatusChange { .. }));
    assert_eq!(store.current_stock(WIDGET).await.unwrap(), Some(3));
}

#[tokio::test]
#[serial]
async fn refund_with_restock_returns_quantities() {
    let store = get_test_store().await;

    let sale_id = store.append_sale(&cash_draft(vec![widget_line(2)])).await.unwrap();
    store
        .set_status(sale_id, SaleStatus::Refunded, RestockOnRefund::Restock)
        .await
        .unwrap();

    assert_eq!(store.current_stock(WIDGET).await.unwrap(), Some(5));
}

#[tokio::test]
#[serial]
async fn set_status_on_unknown_sale_fails() {
    let store = get_test_store().await;
    let err = store
        .set_status(SaleId::new(42), SaleStatus::Refunded, RestockOnRefund::StatusOnly)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::SaleNotFound(_)));
}

#[tokio::test]
#[serial]
async fn get_sale_is_idempotent() {
    let store = get_test_store().await;
    let sale_id = store.append_sale(&cash_draft(vec![widget_line(1)])).await.unwrap();

    let first = store.get_sale(sale_id).await.unwrap().unwrap();
    let second = store.get_sale(sale_id).await.unwrap().unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
#[serial]
async fn list_sales_applies_filters() {
    let store = get_test_store().await;

    store.append_sale(&cash_draft(vec![widget_line(1)])).await.unwrap();
    let card_sale = store
        .append_sale(&SaleDraft::price(
            EmployeeId::new(1),
            None,
            PaymentMethod::Card,
            vec![widget_line(1)],
            1000,
        ))
        .await
        .unwrap();
    store
        .set_status(card_sale, SaleStatus::Refunded, RestockOnRefund::StatusOnly)
        .await
        .unwrap();

    let all = store.list_sales(&SaleFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let card_only = store
        .list_sales(&SaleFilter {
            payment_method: Some(PaymentMethod::Card),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(card_only.len(), 1);
    assert_eq!(card_only[0].id, card_sale);

    let refunded = store
        .list_sales(&SaleFilter {
            status: Some(SaleStatus::Refunded),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(refunded.len(), 1);

    let limited = store
        .list_sales(&SaleFilter {
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
#[serial]
async fn directory_lookups() {
    let store = get_test_store().await;

    let jane = store.employee(EmployeeId::new(1)).await.unwrap().unwrap();
    assert_eq!(jane.username, "jane");
    assert!(jane.status.is_active());
    assert!(store.employee(EmployeeId::new(99)).await.unwrap().is_none());

    let alice = store.customer(CustomerId::new(1)).await.unwrap().unwrap();
    assert_eq!(alice.name, "Alice Johnson");
    assert_eq!(store.list_customers().await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn list_products_applies_filters() {
    let store = get_test_store().await;

    let all = store.list_products(&Default::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let active = store
        .list_products(&store::ProductFilter {
            status: Some(store::ProductStatus::Active),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 2);

    let searched = store
        .list_products(&store::ProductFilter {
            search: Some("wid".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].name, "Widget");

    let low = store
        .list_products(&store::ProductFilter {
            low_stock_below: Some(4),
            ..Default::default()
        })
        .await
        .unwrap();
    // Gadget (3) and Relic (0).
    assert_eq!(low.len(), 2);
}
