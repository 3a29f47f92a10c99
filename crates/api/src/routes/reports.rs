//! Dashboard report endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{OrderReport, StockReport};
use store::KitchenStore;

use crate::AppState;
use crate::error::ApiError;

/// GET /reports/stock
#[tracing::instrument(skip(state))]
pub async fn stock<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<StockReport>, ApiError> {
    Ok(Json(state.reports.stock_report().await?))
}

/// GET /reports/orders
#[tracing::instrument(skip(state))]
pub async fn orders<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<OrderReport>, ApiError> {
    Ok(Json(state.reports.order_report().await?))
}
