//! Store settings endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use domain::Settings;
use store::PosStore;

use crate::error::ApiError;
use crate::routes::sales::{AppState, authenticate};

/// GET /settings — the running store/receipt/tax configuration.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: PosStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Settings>, ApiError> {
    authenticate(&state, &headers).await?;
    Ok(Json(state.coordinator.settings().clone()))
}
