//! Ingredient and stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{IngredientId, StockLotId, UnitOfMeasure};
use domain::{DomainError, NewStockLot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{Ingredient, KitchenStore, StockLot};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub ingredient_id: i64,
    pub unit: String,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DeductRequest {
    /// Zero or negative.
    pub quantity: Decimal,
    pub unit: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct DeductResponse {
    pub deducted: Decimal,
    pub unit: UnitOfMeasure,
}

fn parse_unit(unit: &str) -> Result<UnitOfMeasure, ApiError> {
    unit.parse::<UnitOfMeasure>()
        .map_err(|e| ApiError::Domain(DomainError::from(e)))
}

// -- Handlers --

/// GET /ingredients — list all ingredients.
#[tracing::instrument(skip(state))]
pub async fn ingredients<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    Ok(Json(state.inventory.list_ingredients().await?))
}

/// GET /stock — list every stock lot, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<StockLot>>, ApiError> {
    Ok(Json(state.inventory.list_stock().await?))
}

/// GET /stock/{lot_id} — one stock lot.
#[tracing::instrument(skip(state))]
pub async fn get<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(lot_id): Path<String>,
) -> Result<Json<StockLot>, ApiError> {
    let lot_id = lot_id
        .parse::<StockLotId>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid stock lot id: {e}")))?;
    Ok(Json(state.inventory.get_stock_lot(lot_id).await?))
}

/// GET /ingredients/{id}/stock — lots of one ingredient.
#[tracing::instrument(skip(state))]
pub async fn for_ingredient<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<StockLot>>, ApiError> {
    Ok(Json(
        state
            .inventory
            .stock_for_ingredient(IngredientId::new(id))
            .await?,
    ))
}

/// POST /stock — record a delivery.
#[tracing::instrument(skip(state))]
pub async fn ingest<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<IngestRequest>,
) -> Result<(StatusCode, Json<StockLot>), ApiError> {
    let new_lot = NewStockLot::new(
        IngredientId::new(req.ingredient_id),
        parse_unit(&req.unit)?,
        req.quantity,
        req.cost,
        req.delivery_date,
    )?;
    let lot = state.inventory.ingest(new_lot).await?;
    Ok((StatusCode::CREATED, Json(lot)))
}

/// POST /ingredients/{id}/stock/deduct — remove stock outside of an order.
#[tracing::instrument(skip(state))]
pub async fn deduct<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<DeductRequest>,
) -> Result<Json<DeductResponse>, ApiError> {
    let unit = parse_unit(&req.unit)?;
    let deducted = state
        .inventory
        .deduct(IngredientId::new(id), unit, req.quantity)
        .await?;
    Ok(Json(DeductResponse { deducted, unit }))
}
