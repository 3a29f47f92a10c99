use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Ingredient, IngredientId, MenuItem, MenuItemId, Order, OrderId, RecipeLine, Result, StockLot,
    StockLotId, StoreError,
    repository::{KitchenReader, KitchenStore, UnitOfWork},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    menu_items: BTreeMap<MenuItemId, MenuItem>,
    ingredients: BTreeMap<IngredientId, Ingredient>,
    recipe_lines: BTreeMap<(MenuItemId, IngredientId), RecipeLine>,
    stock_lots: HashMap<StockLotId, StockLot>,
    orders: HashMap<OrderId, Order>,
}

impl Tables {
    fn recipe_lines(&self, menu_item_id: MenuItemId) -> Vec<RecipeLine> {
        // BTreeMap keys sort by (menu item, ingredient), so the range is
        // already ordered by ingredient id.
        self.recipe_lines
            .range(
                (menu_item_id, IngredientId::new(i64::MIN))
                    ..=(menu_item_id, IngredientId::new(i64::MAX)),
            )
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn stock_lots(&self, filter: Option<IngredientId>) -> Vec<StockLot> {
        let mut lots: Vec<_> = self
            .stock_lots
            .values()
            .filter(|lot| filter.is_none_or(|id| lot.ingredient_id == id))
            .cloned()
            .collect();
        lots.sort_by_key(StockLot::fifo_key);
        lots
    }

    fn orders(&self) -> Vec<Order> {
        let mut orders: Vec<_> = self.orders.values().cloned().collect();
        orders.sort_by(|a, b| a.created_on.cmp(&b.created_on).then(a.id.cmp(&b.id)));
        orders
    }

    fn insert_menu_item(&mut self, item: &MenuItem) -> Result<()> {
        if item.price < Decimal::ZERO {
            return Err(StoreError::CheckViolation("menu_items_price_non_negative".into()));
        }
        if self.menu_items.contains_key(&item.id) {
            return Err(StoreError::UniqueViolation(format!("menu item {}", item.id)));
        }
        self.menu_items.insert(item.id, item.clone());
        Ok(())
    }

    fn insert_ingredient(&mut self, ingredient: &Ingredient) -> Result<()> {
        if self.ingredients.contains_key(&ingredient.id) {
            return Err(StoreError::UniqueViolation(format!(
                "ingredient {}",
                ingredient.id
            )));
        }
        if self.ingredients.values().any(|i| i.name == ingredient.name) {
            return Err(StoreError::UniqueViolation(format!(
                "ingredient name {:?}",
                ingredient.name
            )));
        }
        self.ingredients.insert(ingredient.id, ingredient.clone());
        Ok(())
    }

    fn insert_recipe_line(&mut self, line: &RecipeLine) -> Result<()> {
        if line.quantity < Decimal::ZERO {
            return Err(StoreError::CheckViolation("recipe_lines_quantity_non_negative".into()));
        }
        if !self.menu_items.contains_key(&line.menu_item_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "menu item {}",
                line.menu_item_id
            )));
        }
        if !self.ingredients.contains_key(&line.ingredient_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "ingredient {}",
                line.ingredient_id
            )));
        }
        let key = (line.menu_item_id, line.ingredient_id);
        if self.recipe_lines.contains_key(&key) {
            return Err(StoreError::UniqueViolation(format!(
                "recipe line {}/{}",
                line.menu_item_id, line.ingredient_id
            )));
        }
        self.recipe_lines.insert(key, line.clone());
        Ok(())
    }

    fn insert_stock_lot(&mut self, lot: &StockLot) -> Result<()> {
        if lot.quantity < Decimal::ZERO {
            return Err(StoreError::CheckViolation("stock_lots_quantity_non_negative".into()));
        }
        if lot.cost < Decimal::ZERO {
            return Err(StoreError::CheckViolation("stock_lots_cost_non_negative".into()));
        }
        if !self.ingredients.contains_key(&lot.ingredient_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "ingredient {}",
                lot.ingredient_id
            )));
        }
        if self.stock_lots.contains_key(&lot.id) {
            return Err(StoreError::UniqueViolation(format!("stock lot {}", lot.id)));
        }
        self.stock_lots.insert(lot.id, lot.clone());
        Ok(())
    }

    fn set_stock_lot_quantity(&mut self, id: StockLotId, quantity: Decimal) -> Result<()> {
        if quantity < Decimal::ZERO {
            return Err(StoreError::CheckViolation("stock_lots_quantity_non_negative".into()));
        }
        let lot = self
            .stock_lots
            .get_mut(&id)
            .ok_or_else(|| StoreError::RowNotFound(format!("stock lot {id}")))?;
        lot.quantity = quantity;
        Ok(())
    }

    fn insert_order(&mut self, order: &Order) -> Result<()> {
        if !self.menu_items.contains_key(&order.menu_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "menu item {}",
                order.menu_id
            )));
        }
        if self.orders.contains_key(&order.id) {
            return Err(StoreError::UniqueViolation(format!("order {}", order.id)));
        }
        self.orders.insert(order.id, order.clone());
        Ok(())
    }
}

/// In-memory kitchen store for tests and local runs.
///
/// A unit of work holds the store's write lock from `begin` until it commits
/// or rolls back, so units of work run one at a time. Writes are staged on a
/// private copy of the tables and swapped in on commit.
///
/// Every `begin` clones all tables, including the full order history, so the
/// cost of a unit of work grows linearly with the number of stored orders.
/// Use [`PostgresKitchenStore`](crate::PostgresKitchenStore) for long-lived data.
#[derive(Clone, Default)]
pub struct InMemoryKitchenStore {
    tables: Arc<RwLock<Tables>>,
    fail_on_commit: Arc<AtomicBool>,
}

impl InMemoryKitchenStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent commit fail until reset.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of committed stock lots.
    pub async fn stock_lot_count(&self) -> usize {
        self.tables.read().await.stock_lots.len()
    }
}

#[async_trait]
impl KitchenStore for InMemoryKitchenStore {
    type Reader = InMemoryReader;
    type UnitOfWork = InMemoryUnitOfWork;

    async fn reader(&self) -> Result<InMemoryReader> {
        Ok(InMemoryReader {
            tables: self.tables.clone(),
        })
    }

    /// Takes the write lock and stages a full copy of the tables; O(n) in
    /// stored rows.
    async fn begin(&self) -> Result<InMemoryUnitOfWork> {
        let guard = self.tables.clone().write_owned().await;
        let staged = (*guard).clone();
        Ok(InMemoryUnitOfWork {
            guard,
            staged,
            fail_on_commit: self.fail_on_commit.clone(),
        })
    }
}

/// Reader over the committed state of an [`InMemoryKitchenStore`].
pub struct InMemoryReader {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl KitchenReader for InMemoryReader {
    async fn list_menu_items(&mut self) -> Result<Vec<MenuItem>> {
        Ok(self.tables.read().await.menu_items.values().cloned().collect())
    }

    async fn get_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        Ok(self.tables.read().await.menu_items.get(&id).cloned())
    }

    async fn recipe_lines(&mut self, menu_item_id: MenuItemId) -> Result<Vec<RecipeLine>> {
        Ok(self.tables.read().await.recipe_lines(menu_item_id))
    }

    async fn list_ingredients(&mut self) -> Result<Vec<Ingredient>> {
        Ok(self.tables.read().await.ingredients.values().cloned().collect())
    }

    async fn get_ingredient(&mut self, id: IngredientId) -> Result<Option<Ingredient>> {
        Ok(self.tables.read().await.ingredients.get(&id).cloned())
    }

    async fn list_stock_lots(&mut self) -> Result<Vec<StockLot>> {
        Ok(self.tables.read().await.stock_lots(None))
    }

    async fn get_stock_lot(&mut self, id: StockLotId) -> Result<Option<StockLot>> {
        Ok(self.tables.read().await.stock_lots.get(&id).cloned())
    }

    async fn stock_lots_for_ingredient(&mut self, id: IngredientId) -> Result<Vec<StockLot>> {
        Ok(self.tables.read().await.stock_lots(Some(id)))
    }

    async fn list_orders(&mut self) -> Result<Vec<Order>> {
        Ok(self.tables.read().await.orders())
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }
}

/// Unit of work over an [`InMemoryKitchenStore`].
pub struct InMemoryUnitOfWork {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Tables,
    fail_on_commit: Arc<AtomicBool>,
}

#[async_trait]
impl KitchenReader for InMemoryUnitOfWork {
    async fn list_menu_items(&mut self) -> Result<Vec<MenuItem>> {
        Ok(self.staged.menu_items.values().cloned().collect())
    }

    async fn get_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        Ok(self.staged.menu_items.get(&id).cloned())
    }

    async fn recipe_lines(&mut self, menu_item_id: MenuItemId) -> Result<Vec<RecipeLine>> {
        Ok(self.staged.recipe_lines(menu_item_id))
    }

    async fn list_ingredients(&mut self) -> Result<Vec<Ingredient>> {
        Ok(self.staged.ingredients.values().cloned().collect())
    }

    async fn get_ingredient(&mut self, id: IngredientId) -> Result<Option<Ingredient>> {
        Ok(self.staged.ingredients.get(&id).cloned())
    }

    async fn list_stock_lots(&mut self) -> Result<Vec<StockLot>> {
        Ok(self.staged.stock_lots(None))
    }

    async fn get_stock_lot(&mut self, id: StockLotId) -> Result<Option<StockLot>> {
        Ok(self.staged.stock_lots.get(&id).cloned())
    }

    async fn stock_lots_for_ingredient(&mut self, id: IngredientId) -> Result<Vec<StockLot>> {
        Ok(self.staged.stock_lots(Some(id)))
    }

    async fn list_orders(&mut self) -> Result<Vec<Order>> {
        Ok(self.staged.orders())
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.staged.orders.get(&id).cloned())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn insert_menu_item(&mut self, item: &MenuItem) -> Result<()> {
        self.staged.insert_menu_item(item)
    }

    async fn insert_ingredient(&mut self, ingredient: &Ingredient) -> Result<()> {
        self.staged.insert_ingredient(ingredient)
    }

    async fn insert_recipe_line(&mut self, line: &RecipeLine) -> Result<()> {
        self.staged.insert_recipe_line(line)
    }

    async fn insert_stock_lot(&mut self, lot: &StockLot) -> Result<()> {
        self.staged.insert_stock_lot(lot)
    }

    async fn set_stock_lot_quantity(&mut self, id: StockLotId, quantity: Decimal) -> Result<()> {
        self.staged.set_stock_lot_quantity(id, quantity)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.staged.insert_order(order)
    }

    async fn commit(self) -> Result<()> {
        if self.fail_on_commit.load(Ordering::SeqCst) {
            return Err(StoreError::CommitFailed(
                "in-memory store configured to fail commits".to_string(),
            ));
        }
        let InMemoryUnitOfWork {
            mut guard, staged, ..
        } = self;
        *guard = staged;
        tracing::debug!("in-memory unit of work committed");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        tracing::debug!("in-memory unit of work rolled back");
        Ok(())
    }
}
