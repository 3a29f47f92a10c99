//! Menu catalog queries.

use common::{MenuItemId, UnitOfMeasure};
use rust_decimal::Decimal;
use serde::Serialize;
use store::{Ingredient, KitchenReader, KitchenStore, MenuItem};

use crate::error::{DomainError, Entity};
use crate::inventory::{Availability, compute_availability};

/// One ingredient of a recipe together with the amount a portion needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeIngredient {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub quantity: Decimal,
    pub unit: UnitOfMeasure,
}

/// A menu item with its full recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItemDetail {
    #[serde(flatten)]
    pub item: MenuItem,
    pub ingredients: Vec<RecipeIngredient>,
}

/// Read-only access to the menu.
pub struct MenuService<S: KitchenStore> {
    store: S,
}

impl<S: KitchenStore> MenuService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists the menu without recipe detail.
    #[tracing::instrument(skip(self))]
    pub async fn list_menu(&self) -> Result<Vec<MenuItem>, DomainError> {
        let mut reader = self.store.reader().await?;
        Ok(reader.list_menu_items().await?)
    }

    /// Returns a menu item with its recipe lines and ingredient details.
    #[tracing::instrument(skip(self))]
    pub async fn get_menu_item(&self, id: MenuItemId) -> Result<MenuItemDetail, DomainError> {
        let mut reader = self.store.reader().await?;
        let item = reader
            .get_menu_item(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::MenuItem, id))?;

        let lines = reader.recipe_lines(id).await?;
        let mut ingredients = Vec::with_capacity(lines.len());
        for line in lines {
            let ingredient = reader
                .get_ingredient(line.ingredient_id)
                .await?
                .ok_or_else(|| DomainError::not_found(Entity::Ingredient, line.ingredient_id))?;
            ingredients.push(RecipeIngredient {
                ingredient,
                quantity: line.quantity,
                unit: line.unit,
            });
        }

        Ok(MenuItemDetail { item, ingredients })
    }

    /// Computes availability without locking stock. The answer may be stale
    /// by the time an order is placed.
    #[tracing::instrument(skip(self))]
    pub async fn availability(&self, id: MenuItemId) -> Result<Availability, DomainError> {
        let mut reader = self.store.reader().await?;
        compute_availability(&mut reader, id).await
    }
}
