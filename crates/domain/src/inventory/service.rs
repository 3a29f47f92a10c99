//! Inventory service: stock queries, deliveries and manual deductions.

use common::{IngredientId, StockLotId, UnitOfMeasure};
use rust_decimal::Decimal;
use store::{Ingredient, KitchenReader, KitchenStore, StockLot, UnitOfWork};

use super::ledger::{self, NewStockLot};
use crate::error::{DomainError, Entity};

/// Service for reading and adjusting stock.
///
/// Writes run in their own unit of work and are committed before returning.
pub struct InventoryService<S: KitchenStore> {
    store: S,
}

impl<S: KitchenStore> InventoryService<S> {
    /// Creates a new inventory service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_ingredients(&self) -> Result<Vec<Ingredient>, DomainError> {
        let mut reader = self.store.reader().await?;
        Ok(reader.list_ingredients().await?)
    }

    /// Lists every stock lot, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_stock(&self) -> Result<Vec<StockLot>, DomainError> {
        let mut reader = self.store.reader().await?;
        Ok(reader.list_stock_lots().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_stock_lot(&self, id: StockLotId) -> Result<StockLot, DomainError> {
        let mut reader = self.store.reader().await?;
        reader
            .get_stock_lot(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::StockLot, id))
    }

    /// Lists the lots of one ingredient. Empty when it has none.
    #[tracing::instrument(skip(self))]
    pub async fn stock_for_ingredient(
        &self,
        ingredient_id: IngredientId,
    ) -> Result<Vec<StockLot>, DomainError> {
        let mut reader = self.store.reader().await?;
        if reader.get_ingredient(ingredient_id).await?.is_none() {
            return Err(DomainError::not_found(Entity::Ingredient, ingredient_id));
        }
        Ok(reader.stock_lots_for_ingredient(ingredient_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn total_available(
        &self,
        ingredient_id: IngredientId,
        unit: UnitOfMeasure,
    ) -> Result<Decimal, DomainError> {
        let mut reader = self.store.reader().await?;
        ledger::total_available(&mut reader, ingredient_id, unit).await
    }

    /// Records a delivery.
    #[tracing::instrument(skip(self))]
    pub async fn ingest(&self, new_lot: NewStockLot) -> Result<StockLot, DomainError> {
        let mut uow = self.store.begin().await?;
        match ledger::ingest(&mut uow, new_lot).await {
            Ok(lot) => {
                uow.commit().await?;
                metrics::counter!("stock_lots_ingested_total").increment(1);
                tracing::info!(lot_id = %lot.id, ingredient_id = %lot.ingredient_id, "stock lot ingested");
                Ok(lot)
            }
            Err(err) => {
                rollback(uow).await;
                Err(err)
            }
        }
    }

    /// Removes stock outside of an order. `adjustment` must be zero or
    /// negative. Returns the amount removed.
    #[tracing::instrument(skip(self))]
    pub async fn deduct(
        &self,
        ingredient_id: IngredientId,
        unit: UnitOfMeasure,
        adjustment: Decimal,
    ) -> Result<Decimal, DomainError> {
        let mut uow = self.store.begin().await?;
        match ledger::deduct(&mut uow, ingredient_id, unit, adjustment).await {
            Ok(deducted) => {
                uow.commit().await?;
                metrics::counter!("stock_deductions_total").increment(1);
                Ok(deducted)
            }
            Err(err) => {
                rollback(uow).await;
                Err(err)
            }
        }
    }
}

pub(crate) async fn rollback<U: UnitOfWork>(uow: U) {
    if let Err(err) = uow.rollback().await {
        tracing::error!(error = %err, "rollback failed");
    }
}
