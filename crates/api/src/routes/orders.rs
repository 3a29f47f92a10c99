//! Order placement and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{MenuItemId, OrderId};
use serde::Deserialize;
use store::{KitchenStore, Order};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub menu_id: i64,
}

/// POST /orders — place one order for a menu item.
#[tracing::instrument(skip(state))]
pub async fn place<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .orders
        .place_order(MenuItemId::new(req.menu_id))
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — list all orders, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// GET /orders/{id} — one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = id
        .parse::<OrderId>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(Json(state.orders.get_order(order_id).await?))
}
