use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    Ingredient, IngredientId, MenuItem, MenuItemId, Order, OrderId, RecipeLine, Result, StockLot,
    StockLotId, StoreError, UnitOfMeasure,
    repository::{KitchenReader, KitchenStore, UnitOfWork},
};

const STOCK_LOT_COLUMNS: &str =
    "id, ingredient_id, unit, quantity, cost, delivery_date, created_on";

/// PostgreSQL-backed kitchen store.
///
/// A unit of work is a database transaction. Stock lots read inside it are
/// locked with `SELECT ... FOR UPDATE`, so two placements touching the same
/// ingredient are serialized at the row level.
#[derive(Clone)]
pub struct PostgresKitchenStore {
    pool: PgPool,
}

impl PostgresKitchenStore {
    /// Creates a new PostgreSQL kitchen store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl KitchenStore for PostgresKitchenStore {
    type Reader = PostgresReader;
    type UnitOfWork = PostgresUnitOfWork;

    async fn reader(&self) -> Result<PostgresReader> {
        Ok(PostgresReader {
            conn: self.pool.acquire().await?,
        })
    }

    async fn begin(&self) -> Result<PostgresUnitOfWork> {
        Ok(PostgresUnitOfWork {
            tx: self.pool.begin().await?,
        })
    }
}

/// Reader on a pooled connection, outside any transaction.
pub struct PostgresReader {
    conn: PoolConnection<Postgres>,
}

/// Unit of work backed by a PostgreSQL transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

fn decode_unit(row: &PgRow) -> Result<UnitOfMeasure> {
    let unit: String = row.try_get("unit")?;
    unit.parse()
        .map_err(|e: common::UnknownUnit| StoreError::Decode(e.to_string()))
}

fn row_to_menu_item(row: PgRow) -> Result<MenuItem> {
    Ok(MenuItem {
        id: MenuItemId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        created_on: row.try_get("created_on")?,
        on_menu: row.try_get("on_menu")?,
    })
}

fn row_to_ingredient(row: PgRow) -> Result<Ingredient> {
    Ok(Ingredient {
        id: IngredientId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

fn row_to_recipe_line(row: PgRow) -> Result<RecipeLine> {
    Ok(RecipeLine {
        unit: decode_unit(&row)?,
        menu_item_id: MenuItemId::new(row.try_get("menu_item_id")?),
        ingredient_id: IngredientId::new(row.try_get("ingredient_id")?),
        quantity: row.try_get("quantity")?,
    })
}

fn row_to_stock_lot(row: PgRow) -> Result<StockLot> {
    Ok(StockLot {
        unit: decode_unit(&row)?,
        id: StockLotId::from_uuid(row.try_get::<Uuid, _>("id")?),
        ingredient_id: IngredientId::new(row.try_get("ingredient_id")?),
        quantity: row.try_get("quantity")?,
        cost: row.try_get("cost")?,
        delivery_date: row.try_get("delivery_date")?,
        created_on: row.try_get("created_on")?,
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        menu_id: MenuItemId::new(row.try_get("menu_item_id")?),
        created_on: row.try_get("created_on")?,
    })
}

// Queries shared by readers and units of work. Both deref to `PgConnection`.

async fn fetch_menu_items(conn: &mut PgConnection) -> Result<Vec<MenuItem>> {
    let rows = sqlx::query(
        "SELECT id, name, description, price, created_on, on_menu FROM menu_items ORDER BY id",
    )
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(row_to_menu_item).collect()
}

async fn fetch_menu_item(conn: &mut PgConnection, id: MenuItemId) -> Result<Option<MenuItem>> {
    let row = sqlx::query(
        "SELECT id, name, description, price, created_on, on_menu FROM menu_items WHERE id = $1",
    )
    .bind(id.as_i64())
    .fetch_optional(conn)
    .await?;
    row.map(row_to_menu_item).transpose()
}

async fn fetch_recipe_lines(
    conn: &mut PgConnection,
    menu_item_id: MenuItemId,
) -> Result<Vec<RecipeLine>> {
    let rows = sqlx::query(
        r#"
        SELECT menu_item_id, ingredient_id, quantity, unit
        FROM recipe_lines
        WHERE menu_item_id = $1
        ORDER BY ingredient_id ASC
        "#,
    )
    .bind(menu_item_id.as_i64())
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(row_to_recipe_line).collect()
}

async fn fetch_ingredients(conn: &mut PgConnection) -> Result<Vec<Ingredient>> {
    let rows = sqlx::query("SELECT id, name, description FROM ingredients ORDER BY id")
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(row_to_ingredient).collect()
}

async fn fetch_ingredient(conn: &mut PgConnection, id: IngredientId) -> Result<Option<Ingredient>> {
    let row = sqlx::query("SELECT id, name, description FROM ingredients WHERE id = $1")
        .bind(id.as_i64())
        .fetch_optional(conn)
        .await?;
    row.map(row_to_ingredient).transpose()
}

async fn fetch_stock_lots(conn: &mut PgConnection) -> Result<Vec<StockLot>> {
    let sql = format!(
        "SELECT {STOCK_LOT_COLUMNS} FROM stock_lots ORDER BY delivery_date, created_on, id"
    );
    let rows = sqlx::query(&sql).fetch_all(conn).await?;
    rows.into_iter().map(row_to_stock_lot).collect()
}

async fn fetch_stock_lot(conn: &mut PgConnection, id: StockLotId) -> Result<Option<StockLot>> {
    let sql = format!("SELECT {STOCK_LOT_COLUMNS} FROM stock_lots WHERE id = $1");
    let row = sqlx::query(&sql)
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await?;
    row.map(row_to_stock_lot).transpose()
}

async fn fetch_stock_lots_for_ingredient(
    conn: &mut PgConnection,
    id: IngredientId,
    for_update: bool,
) -> Result<Vec<StockLot>> {
    let mut sql = format!(
        "SELECT {STOCK_LOT_COLUMNS} FROM stock_lots WHERE ingredient_id = $1 \
         ORDER BY delivery_date, created_on, id"
    );
    if for_update {
        sql.push_str(" FOR UPDATE");
    }
    let rows = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(row_to_stock_lot).collect()
}

async fn fetch_orders(conn: &mut PgConnection) -> Result<Vec<Order>> {
    let rows = sqlx::query("SELECT id, menu_item_id, created_on FROM orders ORDER BY created_on, id")
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(row_to_order).collect()
}

async fn fetch_order(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>> {
    let row = sqlx::query("SELECT id, menu_item_id, created_on FROM orders WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await?;
    row.map(row_to_order).transpose()
}

#[async_trait]
impl KitchenReader for PostgresReader {
    async fn list_menu_items(&mut self) -> Result<Vec<MenuItem>> {
        fetch_menu_items(&mut self.conn).await
    }

    async fn get_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        fetch_menu_item(&mut self.conn, id).await
    }

    async fn recipe_lines(&mut self, menu_item_id: MenuItemId) -> Result<Vec<RecipeLine>> {
        fetch_recipe_lines(&mut self.conn, menu_item_id).await
    }

    async fn list_ingredients(&mut self) -> Result<Vec<Ingredient>> {
        fetch_ingredients(&mut self.conn).await
    }

    async fn get_ingredient(&mut self, id: IngredientId) -> Result<Option<Ingredient>> {
        fetch_ingredient(&mut self.conn, id).await
    }

    async fn list_stock_lots(&mut self) -> Result<Vec<StockLot>> {
        fetch_stock_lots(&mut self.conn).await
    }

    async fn get_stock_lot(&mut self, id: StockLotId) -> Result<Option<StockLot>> {
        fetch_stock_lot(&mut self.conn, id).await
    }

    async fn stock_lots_for_ingredient(&mut self, id: IngredientId) -> Result<Vec<StockLot>> {
        fetch_stock_lots_for_ingredient(&mut self.conn, id, false).await
    }

    async fn list_orders(&mut self) -> Result<Vec<Order>> {
        fetch_orders(&mut self.conn).await
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        fetch_order(&mut self.conn, id).await
    }
}

#[async_trait]
impl KitchenReader for PostgresUnitOfWork {
    async fn list_menu_items(&mut self) -> Result<Vec<MenuItem>> {
        fetch_menu_items(&mut self.tx).await
    }

    async fn get_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        fetch_menu_item(&mut self.tx, id).await
    }

    async fn recipe_lines(&mut self, menu_item_id: MenuItemId) -> Result<Vec<RecipeLine>> {
        fetch_recipe_lines(&mut self.tx, menu_item_id).await
    }

    async fn list_ingredients(&mut self) -> Result<Vec<Ingredient>> {
        fetch_ingredients(&mut self.tx).await
    }

    async fn get_ingredient(&mut self, id: IngredientId) -> Result<Option<Ingredient>> {
        fetch_ingredient(&mut self.tx, id).await
    }

    async fn list_stock_lots(&mut self) -> Result<Vec<StockLot>> {
        fetch_stock_lots(&mut self.tx).await
    }

    async fn get_stock_lot(&mut self, id: StockLotId) -> Result<Option<StockLot>> {
        fetch_stock_lot(&mut self.tx, id).await
    }

    async fn stock_lots_for_ingredient(&mut self, id: IngredientId) -> Result<Vec<StockLot>> {
        fetch_stock_lots_for_ingredient(&mut self.tx, id, true).await
    }

    async fn list_orders(&mut self) -> Result<Vec<Order>> {
        fetch_orders(&mut self.tx).await
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        fetch_order(&mut self.tx, id).await
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn insert_menu_item(&mut self, item: &MenuItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, name, description, price, created_on, on_menu)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id.as_i64())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.created_on)
        .bind(item.on_menu)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_ingredient(&mut self, ingredient: &Ingredient) -> Result<()> {
        sqlx::query("INSERT INTO ingredients (id, name, description) VALUES ($1, $2, $3)")
            .bind(ingredient.id.as_i64())
            .bind(&ingredient.name)
            .bind(&ingredient.description)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_recipe_line(&mut self, line: &RecipeLine) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recipe_lines (menu_item_id, ingredient_id, quantity, unit)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(line.menu_item_id.as_i64())
        .bind(line.ingredient_id.as_i64())
        .bind(line.quantity)
        .bind(line.unit.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_stock_lot(&mut self, lot: &StockLot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_lots (id, ingredient_id, unit, quantity, cost, delivery_date, created_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(lot.id.as_uuid())
        .bind(lot.ingredient_id.as_i64())
        .bind(lot.unit.as_str())
        .bind(lot.quantity)
        .bind(lot.cost)
        .bind(lot.delivery_date)
        .bind(lot.created_on)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_stock_lot_quantity(&mut self, id: StockLotId, quantity: Decimal) -> Result<()> {
        let result = sqlx::query("UPDATE stock_lots SET quantity = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound(format!("stock lot {id}")));
        }
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query("INSERT INTO orders (id, menu_item_id, created_on) VALUES ($1, $2, $3)")
            .bind(order.id.as_uuid())
            .bind(order.menu_id.as_i64())
            .bind(order.created_on)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        tracing::debug!("transaction rolled back");
        Ok(())
    }
}
