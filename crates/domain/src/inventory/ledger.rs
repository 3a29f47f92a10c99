//! The stock ledger: totals, ingestion and FIFO deduction over stock lots.
//!
//! These functions run against any [`KitchenReader`] or [`UnitOfWork`], so the
//! same code serves standalone requests and the order placement transaction.

use chrono::{DateTime, Utc};
use common::{IngredientId, StockLotId, UnitOfMeasure};
use rust_decimal::Decimal;
use store::{KitchenReader, StockLot, UnitOfWork};

use super::units::convert;
use crate::error::{DomainError, Entity};

/// Largest quantity or cost a single delivery may carry.
///
/// Keeps every lot far enough from [`Decimal::MAX`] that unit conversion and
/// per-ingredient totals stay representable.
pub const MAX_STOCK_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// A validated request to record a stock delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStockLot {
    ingredient_id: IngredientId,
    unit: UnitOfMeasure,
    quantity: Decimal,
    cost: Decimal,
    delivery_date: Option<DateTime<Utc>>,
}

impl NewStockLot {
    /// Validates the amounts. A missing delivery date means "delivered now".
    pub fn new(
        ingredient_id: IngredientId,
        unit: UnitOfMeasure,
        quantity: Decimal,
        cost: Decimal,
        delivery_date: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        if quantity < Decimal::ZERO {
            return Err(DomainError::Validation(format!(
                "stock quantity must not be negative, got {quantity}"
            )));
        }
        if cost < Decimal::ZERO {
            return Err(DomainError::Validation(format!(
                "stock cost must not be negative, got {cost}"
            )));
        }
        if quantity > MAX_STOCK_AMOUNT || cost > MAX_STOCK_AMOUNT {
            return Err(DomainError::Validation(format!(
                "stock quantity and cost must not exceed {MAX_STOCK_AMOUNT}"
            )));
        }
        Ok(Self {
            ingredient_id,
            unit,
            quantity,
            cost,
            delivery_date,
        })
    }

    fn into_lot(self, now: DateTime<Utc>) -> StockLot {
        StockLot {
            id: StockLotId::new(),
            ingredient_id: self.ingredient_id,
            unit: self.unit,
            quantity: self.quantity,
            cost: self.cost,
            delivery_date: self.delivery_date.unwrap_or(now),
            created_on: now,
        }
    }
}

/// Sums the lots after converting each one to `unit`.
///
/// Fails with `Validation` if the total leaves the range of [`Decimal`].
pub fn sum_in_unit(lots: &[StockLot], unit: UnitOfMeasure) -> Result<Decimal, DomainError> {
    lots.iter().try_fold(Decimal::ZERO, |total, lot| {
        let converted = convert(lot.quantity, lot.unit, unit)?;
        total.checked_add(converted).ok_or_else(|| {
            DomainError::Validation(format!(
                "stock of ingredient {} is too large to total in {unit}",
                lot.ingredient_id
            ))
        })
    })
}

/// Works out the new quantity of every lot touched by taking `amount` (in
/// `unit`) out of `lots`, oldest first.
///
/// Each lot is emptied before the next one is touched. Fails with
/// `InsufficientStock` instead of returning a partial plan when the lots
/// together hold less than `amount`.
pub fn plan_deduction(
    ingredient_id: IngredientId,
    lots: &[StockLot],
    unit: UnitOfMeasure,
    amount: Decimal,
) -> Result<Vec<(StockLotId, Decimal)>, DomainError> {
    let available = sum_in_unit(lots, unit)?;
    if amount > available {
        return Err(DomainError::InsufficientStock {
            subject: format!("ingredient {ingredient_id}"),
            detail: format!("requested {amount} {unit}, available {available} {unit}"),
        });
    }

    let mut ordered: Vec<&StockLot> = lots.iter().collect();
    ordered.sort_by_key(|lot| lot.fifo_key());

    let mut remaining = amount;
    let mut plan = Vec::new();
    for lot in ordered {
        if remaining <= Decimal::ZERO {
            break;
        }
        let held = convert(lot.quantity, lot.unit, unit)?;
        if held <= Decimal::ZERO {
            continue;
        }
        if held <= remaining {
            remaining -= held;
            plan.push((lot.id, Decimal::ZERO));
        } else {
            let taken = convert(remaining, unit, lot.unit)?;
            plan.push((lot.id, (lot.quantity - taken).max(Decimal::ZERO)));
            remaining = Decimal::ZERO;
        }
    }
    Ok(plan)
}

async fn require_ingredient<R: KitchenReader>(
    repo: &mut R,
    ingredient_id: IngredientId,
) -> Result<(), DomainError> {
    match repo.get_ingredient(ingredient_id).await? {
        Some(_) => Ok(()),
        None => Err(DomainError::not_found(Entity::Ingredient, ingredient_id)),
    }
}

/// Total stock of an ingredient expressed in `unit`. Zero when it has no lots.
pub async fn total_available<R: KitchenReader>(
    repo: &mut R,
    ingredient_id: IngredientId,
    unit: UnitOfMeasure,
) -> Result<Decimal, DomainError> {
    require_ingredient(&mut *repo, ingredient_id).await?;
    let lots = repo.stock_lots_for_ingredient(ingredient_id).await?;
    sum_in_unit(&lots, unit)
}

/// Records a delivery as a new lot inside `uow`.
pub async fn ingest<U: UnitOfWork>(
    uow: &mut U,
    new_lot: NewStockLot,
) -> Result<StockLot, DomainError> {
    require_ingredient(&mut *uow, new_lot.ingredient_id).await?;
    let lot = new_lot.into_lot(Utc::now());
    uow.insert_stock_lot(&lot).await?;
    Ok(lot)
}

/// Applies a non-positive adjustment to an ingredient's stock inside `uow`.
///
/// `adjustment` is signed: `-300` in milliliters removes 300 ml. Positive
/// adjustments are rejected. Either the whole amount is taken or nothing is
/// written. Returns the amount taken, in `unit`.
pub async fn deduct<U: UnitOfWork>(
    uow: &mut U,
    ingredient_id: IngredientId,
    unit: UnitOfMeasure,
    adjustment: Decimal,
) -> Result<Decimal, DomainError> {
    if adjustment > Decimal::ZERO {
        return Err(DomainError::Validation(format!(
            "deduction must be zero or negative, got {adjustment}"
        )));
    }
    require_ingredient(&mut *uow, ingredient_id).await?;

    let amount = -adjustment;
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let lots = uow.stock_lots_for_ingredient(ingredient_id).await?;
    let plan = plan_deduction(ingredient_id, &lots, unit, amount)?;

    for (lot_id, quantity) in &plan {
        uow.set_stock_lot_quantity(*lot_id, *quantity).await?;
    }
    tracing::debug!(%ingredient_id, %amount, %unit, lots = plan.len(), "stock deducted");
    Ok(amount)
}
