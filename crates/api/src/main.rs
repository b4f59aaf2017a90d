//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::session::{Principal, StaticSessions};
use common::{EmployeeId, Money, ProductId};
use metrics_exporter_prometheus::PrometheusHandle;
use store::records::{AccountStatus, EmployeeRecord, ProductRecord, ProductStatus, Role};
use store::{MemoryStore, PosStore, PostgresStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Seeds the in-memory store so the dev server is usable out of the box,
/// and logs a session token for the seeded admin.
async fn seed_demo_data(store: &MemoryStore, sessions: &StaticSessions) {
    store
        .put_employee(EmployeeRecord {
            id: EmployeeId::new(1),
            username: "admin".to_string(),
            full_name: "Demo Admin".to_string(),
            role: Role::Admin,
            status: AccountStatus::Active,
        })
        .await;
    for (id, name, price_cents, stock) in [
        (1, "Espresso Beans 1kg", 1850, 24),
        (2, "Pour-over Kettle", 4999, 6),
        (3, "Ceramic Mug", 1200, 40),
    ] {
        store
            .put_product(ProductRecord {
                id: ProductId::new(id),
                name: name.to_string(),
                category_id: None,
                price: Money::from_cents(price_cents),
                stock_quantity: stock,
                status: ProductStatus::Active,
            })
            .await;
    }

    let token = sessions.issue(Principal {
        employee_id: EmployeeId::new(1),
        username: "admin".to_string(),
        role: Role::Admin,
    });
    tracing::info!(%token, "issued demo session token for user 'admin'");
}

async fn serve<S: PosStore + Clone + 'static>(
    store: S,
    config: Config,
    sessions: StaticSessions,
    metrics_handle: PrometheusHandle,
) {
    let state = api::create_default_state(store, config.settings.clone(), Arc::new(sessions));
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Load configuration and pick a storage backend
    let config = Config::from_env();
    let sessions = StaticSessions::new();

    match config.database_url.clone() {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to database");
            let store = PostgresStore::new(pool).with_lock_timeout(config.lock_timeout);
            store.run_migrations().await.expect("migrations failed");
            tracing::info!("connected to PostgreSQL");
            serve(store, config, sessions, metrics_handle).await;
        }
        None => {
            let store = MemoryStore::new();
            seed_demo_data(&store, &sessions).await;
            tracing::info!("DATABASE_URL not set; serving from the in-memory store");
            serve(store, config, sessions, metrics_handle).await;
        }
    }
}
