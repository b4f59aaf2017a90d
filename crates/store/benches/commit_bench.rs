use common::{EmployeeId, Money, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{PaymentMethod, PricedLine, SaleDraft};
use store::records::{AccountStatus, EmployeeRecord, ProductRecord, ProductStatus, Role};
use store::{MemoryStore, SaleLedger};

async fn seeded_store(stock: u32) -> MemoryStore {
    let store = MemoryStore::new();
    for id in 1..=20_i64 {
        store
            .put_product(ProductRecord {
                id: ProductId::new(id),
                name: format!("Product {id}"),
                category_id: None,
                price: Money::from_cents(100 * id),
                stock_quantity: stock,
                status: ProductStatus::Active,
            })
            .await;
    }
    store
        .put_employee(EmployeeRecord {
            id: EmployeeId::new(1),
            username: "bench".to_string(),
            full_name: "Bench Cashier".to_string(),
            role: Role::Cashier,
            status: AccountStatus::Active,
        })
        .await;
    store
}

fn draft(line_count: i64) -> SaleDraft {
    let lines: Vec<PricedLine> = (1..=line_count)
        .map(|id| {
            PricedLine::new(
                ProductId::new(id),
                format!("Product {id}"),
                1,
                Money::from_cents(100 * id),
            )
        })
        .collect();
    SaleDraft::price(EmployeeId::new(1), None, PaymentMethod::Cash, lines, 1000)
}

fn bench_commit_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(seeded_store(u32::MAX));
    let draft = draft(1);

    c.bench_function("store/commit_1_line", |b| {
        b.iter(|| {
            rt.block_on(async { store.append_sale(&draft).await.unwrap() });
        });
    });
}

fn bench_commit_twenty_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(seeded_store(u32::MAX));
    let draft = draft(20);

    c.bench_function("store/commit_20_lines", |b| {
        b.iter(|| {
            rt.block_on(async { store.append_sale(&draft).await.unwrap() });
        });
    });
}

fn bench_rejected_commit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    // Zero stock: every commit is rejected without mutating anything.
    let store = rt.block_on(seeded_store(0));
    let draft = draft(5);

    c.bench_function("store/commit_rejected_5_lines", |b| {
        b.iter(|| {
            rt.block_on(async { store.append_sale(&draft).await.unwrap_err() });
        });
    });
}

criterion_group!(
    benches,
    bench_commit_single_line,
    bench_commit_twenty_lines,
    bench_rejected_commit,
);
criterion_main!(benches);
