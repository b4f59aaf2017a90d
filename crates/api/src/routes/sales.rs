//! Sale commit, refund, and read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use checkout::{CheckoutError, SaleCoordinator, SaleRequest};
use chrono::{DateTime, NaiveDate, Utc};
use common::{CustomerId, ProductId, SaleId};
use domain::{CartLine, PricedLine, RestockOnRefund};
use serde::{Deserialize, Serialize};
use store::{PosStore, SaleFilter, SaleLedger, SaleLineRecord, SaleRecord};

use crate::error::ApiError;
use crate::session::{IdentityProvider, Principal};

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub coordinator: SaleCoordinator<S>,
    pub store: S,
    pub sessions: Arc<dyn IdentityProvider>,
}

/// Resolves the request's bearer token to a principal.
///
/// The principal is the only source of the cashier identity; any cashier
/// field a client might put in a body is simply not deserialized.
pub(crate) async fn authenticate<S>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<Principal, ApiError> {
    let token = crate::session::bearer_token(headers)
        .ok_or(ApiError::Checkout(CheckoutError::Unauthenticated))?;
    state
        .sessions
        .resolve(token)
        .await
        .ok_or(ApiError::Checkout(CheckoutError::Unauthenticated))
}

/// Parses a `YYYY-MM-DD` query value into the start or end of that UTC day.
pub(crate) fn parse_day(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, ApiError> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ApiError::BadRequest(format!("invalid date {value:?}: {e}")))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59).expect("valid time")
    } else {
        date.and_hms_opt(0, 0, 0).expect("valid time")
    };
    Ok(time.and_utc())
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CommitSaleRequest {
    pub customer_id: Option<i64>,
    pub payment_method: String,
    pub lines: Vec<CartLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Default)]
pub struct RefundRequest {
    #[serde(default)]
    pub restock: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListSalesQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CommitSaleResponse {
    pub success: bool,
    pub sale_id: SaleId,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: String,
    pub lines: Vec<SaleLineResponse>,
}

#[derive(Serialize)]
pub struct SaleLineResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<&PricedLine> for SaleLineResponse {
    fn from(line: &PricedLine) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            subtotal_cents: line.subtotal.cents(),
        }
    }
}

impl From<&SaleLineRecord> for SaleLineResponse {
    fn from(line: &SaleLineRecord) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            subtotal_cents: line.subtotal.cents(),
        }
    }
}

#[derive(Serialize)]
pub struct SaleResponse {
    pub id: SaleId,
    pub sale_date: String,
    pub customer_id: Option<CustomerId>,
    pub customer_name: Option<String>,
    pub cashier_id: i64,
    pub cashier_name: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: String,
    pub status: String,
}

impl From<&SaleRecord> for SaleResponse {
    fn from(sale: &SaleRecord) -> Self {
        Self {
            id: sale.id,
            sale_date: sale.sale_date.to_rfc3339(),
            customer_id: sale.customer_id,
            customer_name: sale.customer_name.clone(),
            cashier_id: sale.cashier_id.get(),
            cashier_name: sale.cashier_name.clone(),
            subtotal_cents: sale.subtotal.cents(),
            tax_cents: sale.tax.cents(),
            total_cents: sale.total.cents(),
            payment_method: sale.payment_method.to_string(),
            status: sale.status.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct SaleDetailResponse {
    #[serde(flatten)]
    pub sale: SaleResponse,
    pub lines: Vec<SaleLineResponse>,
}

#[derive(Serialize)]
pub struct RefundResponse {
    pub success: bool,
    pub sale_id: SaleId,
    pub status: String,
    pub restocked: bool,
}

// -- Handlers --

/// POST /sales — commit a cart as a durable sale.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: PosStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CommitSaleRequest>,
) -> Result<(axum::http::StatusCode, Json<CommitSaleResponse>), ApiError> {
    let principal = authenticate(&state, &headers).await?;

    let request = SaleRequest {
        cashier_id: principal.employee_id,
        customer_id: req.customer_id.map(CustomerId::new),
        payment_method: req.payment_method,
        lines: req
            .lines
            .iter()
            .map(|l| CartLine::new(l.product_id, l.quantity))
            .collect(),
    };

    let receipt = state.coordinator.commit_sale(request).await?;

    let response = CommitSaleResponse {
        success: true,
        sale_id: receipt.sale_id,
        subtotal_cents: receipt.subtotal.cents(),
        tax_cents: receipt.tax.cents(),
        total_cents: receipt.total.cents(),
        payment_method: receipt.payment_method.to_string(),
        lines: receipt.lines.iter().map(SaleLineResponse::from).collect(),
    };

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /sales — list sale headers, filterable by date range, payment
/// method, and status.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S: PosStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<ListSalesQuery>,
) -> Result<Json<Vec<SaleResponse>>, ApiError> {
    authenticate(&state, &headers).await?;

    let filter = SaleFilter {
        start_date: query
            .start_date
            .as_deref()
            .map(|d| parse_day(d, false))
            .transpose()?,
        end_date: query
            .end_date
            .as_deref()
            .map(|d| parse_day(d, true))
            .transpose()?,
        payment_method: query
            .payment_method
            .as_deref()
            .map(|m| {
                m.parse()
                    .map_err(|e: domain::CartError| ApiError::BadRequest(e.to_string()))
            })
            .transpose()?,
        status: query
            .status
            .as_deref()
            .map(|s| s.parse().map_err(ApiError::BadRequest))
            .transpose()?,
        limit: query.limit,
    };

    let sales = state.store.list_sales(&filter).await?;
    Ok(Json(sales.iter().map(SaleResponse::from).collect()))
}

/// GET /sales/{id} — load a sale header with its lines.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: PosStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<SaleDetailResponse>, ApiError> {
    authenticate(&state, &headers).await?;

    let sale = state
        .store
        .get_sale(SaleId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("sale {id} not found")))?;

    Ok(Json(SaleDetailResponse {
        sale: SaleResponse::from(&sale.sale),
        lines: sale.lines.iter().map(SaleLineResponse::from).collect(),
    }))
}

/// POST /sales/{id}/refund — mark a sale refunded; restocking is an
/// explicit opt-in in the body.
#[tracing::instrument(skip(state, headers, req))]
pub async fn refund<S: PosStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    req: Option<Json<RefundRequest>>,
) -> Result<Json<RefundResponse>, ApiError> {
    let principal = authenticate(&state, &headers).await?;
    let restock = req.map(|Json(r)| r.restock).unwrap_or_default();

    let policy = if restock {
        RestockOnRefund::Restock
    } else {
        RestockOnRefund::StatusOnly
    };
    state
        .coordinator
        .refund_sale(SaleId::new(id), principal.employee_id, policy)
        .await?;

    Ok(Json(RefundResponse {
        success: true,
        sale_id: SaleId::new(id),
        status: domain::SaleStatus::Refunded.to_string(),
        restocked: restock,
    }))
}
