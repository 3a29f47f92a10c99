use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    Ingredient, IngredientId, MenuItem, MenuItemId, Order, OrderId, RecipeLine, Result, StockLot,
    StockLotId,
};

/// Read access to the kitchen tables.
///
/// Implemented both by standalone readers (no locks, possibly stale) and by
/// every [`UnitOfWork`] (reads see the transaction's own staged writes).
#[async_trait]
pub trait KitchenReader: Send {
    /// Lists all menu items ordered by id.
    async fn list_menu_items(&mut self) -> Result<Vec<MenuItem>>;

    async fn get_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>>;

    /// Returns the recipe of a menu item, ordered by ingredient id.
    ///
    /// The order matters: placements lock stock in this order, so every
    /// transaction acquires row locks in the same sequence.
    async fn recipe_lines(&mut self, menu_item_id: MenuItemId) -> Result<Vec<RecipeLine>>;

    /// Lists all ingredients ordered by id.
    async fn list_ingredients(&mut self) -> Result<Vec<Ingredient>>;

    async fn get_ingredient(&mut self, id: IngredientId) -> Result<Option<Ingredient>>;

    /// Lists every stock lot in FIFO order.
    async fn list_stock_lots(&mut self) -> Result<Vec<StockLot>>;

    async fn get_stock_lot(&mut self, id: StockLotId) -> Result<Option<StockLot>>;

    /// Returns the lots of one ingredient in FIFO order (see [`StockLot::fifo_key`]).
    ///
    /// Inside a unit of work the returned rows stay locked against other
    /// writers until the unit of work ends.
    async fn stock_lots_for_ingredient(&mut self, id: IngredientId) -> Result<Vec<StockLot>>;

    /// Lists all orders, oldest first.
    async fn list_orders(&mut self) -> Result<Vec<Order>>;

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>>;
}

/// A transaction scope over the kitchen tables.
///
/// Writes are not visible outside the unit of work until [`commit`] succeeds.
/// Dropping a unit of work without committing rolls it back.
///
/// [`commit`]: UnitOfWork::commit
#[async_trait]
pub trait UnitOfWork: KitchenReader {
    async fn insert_menu_item(&mut self, item: &MenuItem) -> Result<()>;

    async fn insert_ingredient(&mut self, ingredient: &Ingredient) -> Result<()>;

    async fn insert_recipe_line(&mut self, line: &RecipeLine) -> Result<()>;

    async fn insert_stock_lot(&mut self, lot: &StockLot) -> Result<()>;

    /// Overwrites the remaining quantity of a lot.
    ///
    /// Fails with `CheckViolation` for a negative quantity and `RowNotFound`
    /// if the lot does not exist.
    async fn set_stock_lot_quantity(&mut self, id: StockLotId, quantity: Decimal) -> Result<()>;

    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    /// Makes every write of this unit of work durable at once.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this unit of work.
    async fn rollback(self) -> Result<()>;
}

/// A shared store that hands out readers and units of work.
#[async_trait]
pub trait KitchenStore: Send + Sync {
    type Reader: KitchenReader;
    type UnitOfWork: UnitOfWork;

    /// Opens a reader for queries that do not take part in a transaction.
    async fn reader(&self) -> Result<Self::Reader>;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::UnitOfWork>;
}
