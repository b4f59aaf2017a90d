//! Catalog and customer reads used by clients to build carts.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use common::{CategoryId, CustomerId, ProductId};
use serde::{Deserialize, Serialize};
use store::{DirectoryStore, InventoryStore, PosStore, ProductFilter, ProductRecord};

use crate::error::ApiError;
use crate::routes::sales::{AppState, authenticate};

#[derive(Debug, Deserialize, Default)]
pub struct ProductListQuery {
    pub category_id: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
    /// Only products with stock below this threshold (low-stock report).
    pub low_stock_below: Option<u32>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub price_cents: i64,
    pub stock_quantity: u32,
    pub status: String,
}

impl From<&ProductRecord> for ProductResponse {
    fn from(product: &ProductRecord) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            category_id: product.category_id,
            price_cents: product.price.cents(),
            stock_quantity: product.stock_quantity,
            status: product.status.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// GET /products — catalog listing with optional filters.
///
/// The stock quantities in the response are a display snapshot; the
/// commit path re-verifies them.
#[tracing::instrument(skip(state, headers))]
pub async fn products<S: PosStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    authenticate(&state, &headers).await?;

    let filter = ProductFilter {
        category_id: query.category_id.map(CategoryId::new),
        status: query
            .status
            .as_deref()
            .map(|s| s.parse().map_err(ApiError::BadRequest))
            .transpose()?,
        search: query.search,
        low_stock_below: query.low_stock_below,
    };

    let products = state.store.list_products(&filter).await?;
    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}

/// GET /customers — customer list for the cart's customer selector.
#[tracing::instrument(skip(state, headers))]
pub async fn customers<S: PosStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    authenticate(&state, &headers).await?;

    let customers = state.store.list_customers().await?;
    Ok(Json(
        customers
            .into_iter()
            .map(|c| CustomerResponse {
                id: c.id,
                name: c.name,
                phone: c.phone,
                email: c.email,
            })
            .collect(),
    ))
}
