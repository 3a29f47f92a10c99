//! Menu and availability endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::MenuItemId;
use domain::{Availability, MenuItemDetail};
use store::{KitchenStore, MenuItem};

use crate::AppState;
use crate::error::ApiError;

/// GET /menu — list menu items without recipes.
#[tracing::instrument(skip(state))]
pub async fn list<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    Ok(Json(state.menu.list_menu().await?))
}

/// GET /menu/{id} — one menu item with its recipe.
#[tracing::instrument(skip(state))]
pub async fn get<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<MenuItemDetail>, ApiError> {
    Ok(Json(state.menu.get_menu_item(MenuItemId::new(id)).await?))
}

/// GET /menu/{id}/availability — portions the current stock allows.
#[tracing::instrument(skip(state))]
pub async fn availability<S: KitchenStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Availability>, ApiError> {
    Ok(Json(state.menu.availability(MenuItemId::new(id)).await?))
}
