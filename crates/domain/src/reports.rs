//! Read-only summaries for the dashboard.
//!
//! Reports run on a plain reader and may be slightly stale. A row that
//! references a missing record is logged and reported as best it can be.
//! Totals saturate at [`Decimal::MAX`] instead of failing.

use std::collections::BTreeMap;

use common::{IngredientId, MenuItemId, UnitOfMeasure};
use rust_decimal::Decimal;
use serde::Serialize;
use store::{KitchenReader, KitchenStore};

use crate::error::DomainError;
use crate::inventory::convert;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockReportRow {
    pub ingredient_id: IngredientId,
    pub name: String,
    pub lot_count: usize,
    /// Remaining quantity in liters.
    pub total_liters: Decimal,
    /// Sum of what the lots cost on delivery.
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockReport {
    pub rows: Vec<StockReportRow>,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderReportRow {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub orders: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderReport {
    pub rows: Vec<OrderReportRow>,
    pub total_orders: u64,
    pub total_revenue: Decimal,
}

pub struct ReportService<S: KitchenStore> {
    store: S,
}

impl<S: KitchenStore> ReportService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// One row per ingredient, including those without stock.
    #[tracing::instrument(skip(self))]
    pub async fn stock_report(&self) -> Result<StockReport, DomainError> {
        let mut reader = self.store.reader().await?;
        let ingredients = reader.list_ingredients().await?;
        let lots = reader.list_stock_lots().await?;

        let mut rows: BTreeMap<IngredientId, StockReportRow> = ingredients
            .into_iter()
            .map(|ingredient| {
                let row = StockReportRow {
                    ingredient_id: ingredient.id,
                    name: ingredient.name,
                    lot_count: 0,
                    total_liters: Decimal::ZERO,
                    total_cost: Decimal::ZERO,
                };
                (ingredient.id, row)
            })
            .collect();

        for lot in lots {
            let Some(row) = rows.get_mut(&lot.ingredient_id) else {
                tracing::warn!(lot_id = %lot.id, ingredient_id = %lot.ingredient_id, "stock lot without ingredient");
                continue;
            };
            row.lot_count += 1;
            let liters =
                convert(lot.quantity, lot.unit, UnitOfMeasure::Liter).unwrap_or(Decimal::MAX);
            row.total_liters = row.total_liters.saturating_add(liters);
            row.total_cost = row.total_cost.saturating_add(lot.cost);
        }

        let rows: Vec<_> = rows.into_values().collect();
        let total_cost = rows
            .iter()
            .fold(Decimal::ZERO, |total, row| total.saturating_add(row.total_cost));
        Ok(StockReport { rows, total_cost })
    }

    /// One row per menu item, with order counts and revenue at current price.
    #[tracing::instrument(skip(self))]
    pub async fn order_report(&self) -> Result<OrderReport, DomainError> {
        let mut reader = self.store.reader().await?;
        let items = reader.list_menu_items().await?;
        let orders = reader.list_orders().await?;

        let mut counts: BTreeMap<MenuItemId, u64> = BTreeMap::new();
        for order in &orders {
            *counts.entry(order.menu_id).or_default() += 1;
        }

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let count = counts.remove(&item.id).unwrap_or(0);
            rows.push(OrderReportRow {
                menu_item_id: item.id,
                name: item.name,
                orders: count,
                revenue: item.price.saturating_mul(Decimal::from(count)),
            });
        }
        for (menu_item_id, count) in counts {
            tracing::warn!(%menu_item_id, orders = count, "orders reference a missing menu item");
        }

        let total_orders = rows.iter().map(|row| row.orders).sum();
        let total_revenue = rows
            .iter()
            .fold(Decimal::ZERO, |total, row| total.saturating_add(row.revenue));
        Ok(OrderReport {
            rows,
            total_orders,
            total_revenue,
        })
    }
}
