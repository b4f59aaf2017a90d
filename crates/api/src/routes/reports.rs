//! Reporting aggregation over the sale ledger.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use domain::SaleStatus;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use store::{PosStore, SaleFilter, SaleLedger};

use crate::error::ApiError;
use crate::routes::sales::{AppState, authenticate, parse_day};

#[derive(Debug, Deserialize, Default)]
pub struct SummaryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Serialize, Default)]
pub struct MethodBreakdown {
    pub sale_count: u64,
    pub gross_cents: i64,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    /// Completed sales in range.
    pub sale_count: u64,
    pub refunded_count: u64,
    /// Gross takings of completed sales, tax included.
    pub gross_cents: i64,
    pub tax_cents: i64,
    pub by_payment_method: BTreeMap<String, MethodBreakdown>,
}

/// GET /reports/summary — fold the sale stream into range totals.
#[tracing::instrument(skip(state, headers))]
pub async fn summary<S: PosStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
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
        ..Default::default()
    };

    let mut stream = state.store.stream_sales(&filter).await?;

    let mut response = SummaryResponse {
        sale_count: 0,
        refunded_count: 0,
        gross_cents: 0,
        tax_cents: 0,
        by_payment_method: BTreeMap::new(),
    };
    while let Some(sale) = stream.next().await {
        let sale = sale?;
        if sale.status == SaleStatus::Refunded {
            response.refunded_count += 1;
            continue;
        }
        response.sale_count += 1;
        response.gross_cents += sale.total.cents();
        response.tax_cents += sale.tax.cents();
        let entry = response
            .by_payment_method
            .entry(sale.payment_method.to_string())
            .or_default();
        entry.sale_count += 1;
        entry.gross_cents += sale.total.cents();
    }

    Ok(Json(response))
}
