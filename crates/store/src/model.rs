//! Persisted records.
//!
//! These are plain rows. Validation of user input happens before a record is
//! built (see the domain crate); the store itself only enforces the table
//! constraints (keys, references, non-negative amounts).

use chrono::{DateTime, Utc};
use common::{IngredientId, MenuItemId, OrderId, StockLotId, UnitOfMeasure};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A sellable item on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub created_on: DateTime<Utc>,
    pub on_menu: bool,
}

/// A named ingredient. Its stock is the sum of its [`StockLot`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub description: Option<String>,
}

/// The quantity of one ingredient consumed by one portion of a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub menu_item_id: MenuItemId,
    pub ingredient_id: IngredientId,
    pub quantity: Decimal,
    pub unit: UnitOfMeasure,
}

/// A delivered batch of an ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLot {
    pub id: StockLotId,
    pub ingredient_id: IngredientId,
    pub unit: UnitOfMeasure,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub delivery_date: DateTime<Utc>,
    pub created_on: DateTime<Utc>,
}

impl StockLot {
    /// Consumption order: oldest delivery first, ties broken by creation time
    /// and then by id so the order is total.
    pub fn fifo_key(&self) -> (DateTime<Utc>, DateTime<Utc>, StockLotId) {
        (self.delivery_date, self.created_on, self.id)
    }
}

/// A placed order. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub menu_id: MenuItemId,
    pub created_on: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn lot(delivery_date: DateTime<Utc>, created_on: DateTime<Utc>) -> StockLot {
        StockLot {
            id: StockLotId::new(),
            ingredient_id: IngredientId::new(1),
            unit: UnitOfMeasure::Liter,
            quantity: Decimal::ONE,
            cost: Decimal::ZERO,
            delivery_date,
            created_on,
        }
    }

    #[test]
    fn fifo_key_orders_by_delivery_then_creation() {
        let now = Utc::now();
        let older_delivery = lot(now - Duration::days(2), now);
        let same_delivery_created_earlier = lot(now, now - Duration::hours(1));
        let same_delivery_created_later = lot(now, now);

        let mut lots = vec![
            same_delivery_created_later.clone(),
            older_delivery.clone(),
            same_delivery_created_earlier.clone(),
        ];
        lots.sort_by_key(StockLot::fifo_key);

        assert_eq!(lots[0].id, older_delivery.id);
        assert_eq!(lots[1].id, same_delivery_created_earlier.id);
        assert_eq!(lots[2].id, same_delivery_created_later.id);
    }

    #[test]
    fn order_serializes_menu_id() {
        let order = Order {
            id: OrderId::new(),
            menu_id: MenuItemId::new(3),
            created_on: Utc::now(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["menu_id"], 3);
        assert_eq!(json["id"], order.id.to_string());
    }
}
