//! Order placement against PostgreSQL.
//!
//! Concurrent placements race on real row locks here instead of the
//! in-memory store's single writer. Run with:
//!
//! ```bash
//! cargo test -p domain --test postgres_placement -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{IngredientId, MenuItemId, StockLotId, UnitOfMeasure};
use domain::{DomainError, InventoryService, OrderService};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serial_test::serial;
use store::{
    Ingredient, KitchenReader, KitchenStore, MenuItem, PostgresKitchenStore, RecipeLine, StockLot,
    UnitOfWork,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

const SALAD: MenuItemId = MenuItemId::new(1);
const LETTUCE: IngredientId = IngredientId::new(1);

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let store = PostgresKitchenStore::connect(&connection_string, 1)
                .await
                .unwrap();
            store.run_migrations().await.unwrap();
            store.pool().close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// A store with cleared tables, lettuce with one lot of `milliliters`, and a
/// salad that needs 300 ml of it.
async fn salad_store(milliliters: Decimal) -> PostgresKitchenStore {
    let info = get_container_info().await;
    let store = PostgresKitchenStore::connect(&info.connection_string, 10)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, stock_lots, recipe_lines, ingredients, menu_items")
        .execute(store.pool())
        .await
        .unwrap();

    let mut uow = store.begin().await.unwrap();
    uow.insert_menu_item(&MenuItem {
        id: SALAD,
        name: "Salad".into(),
        description: None,
        price: dec!(7.50),
        created_on: Utc::now(),
        on_menu: true,
    })
    .await
    .unwrap();
    uow.insert_ingredient(&Ingredient {
        id: LETTUCE,
        name: "Lettuce".into(),
        description: None,
    })
    .await
    .unwrap();
    uow.insert_recipe_line(&RecipeLine {
        menu_item_id: SALAD,
        ingredient_id: LETTUCE,
        quantity: dec!(300),
        unit: UnitOfMeasure::Milliliter,
    })
    .await
    .unwrap();
    uow.insert_stock_lot(&StockLot {
        id: StockLotId::new(),
        ingredient_id: LETTUCE,
        unit: UnitOfMeasure::Milliliter,
        quantity: milliliters,
        cost: dec!(2),
        delivery_date: Utc::now(),
        created_on: Utc::now(),
    })
    .await
    .unwrap();
    uow.commit().await.unwrap();
    store
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn only_one_of_many_placements_gets_the_last_portion() {
    let store = salad_store(dec!(300)).await;
    let orders = Arc::new(OrderService::new(store.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orders = orders.clone();
            tokio::spawn(async move { orders.place_order(SALAD).await })
        })
        .collect();

    let mut placed = 0;
    let mut rejected = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => placed += 1,
            Err(DomainError::InsufficientStock { .. } | DomainError::Conflict(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed, 1);
    assert_eq!(rejected, 7);

    let mut reader = store.reader().await.unwrap();
    assert_eq!(reader.list_orders().await.unwrap().len(), 1);
    let remaining = InventoryService::new(store)
        .total_available(LETTUCE, UnitOfMeasure::Milliliter)
        .await
        .unwrap();
    assert_eq!(remaining, Decimal::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn concurrent_placements_drain_stock_exactly() {
    let store = salad_store(dec!(900)).await;
    let orders = Arc::new(OrderService::new(store.clone()));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let orders = orders.clone();
            tokio::spawn(async move { orders.place_order(SALAD).await })
        })
        .collect();

    let placed = join_all(handles)
        .await
        .into_iter()
        .filter(|result| matches!(result, Ok(Ok(_))))
        .count();

    assert_eq!(placed, 3);
    let mut reader = store.reader().await.unwrap();
    assert_eq!(reader.list_orders().await.unwrap().len(), 3);
    let remaining = InventoryService::new(store)
        .total_available(LETTUCE, UnitOfMeasure::Milliliter)
        .await
        .unwrap();
    assert_eq!(remaining, Decimal::ZERO);
}
