use chrono::{Duration, Utc};
use common::{IngredientId, MenuItemId, StockLotId, UnitOfMeasure};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{MenuService, OrderService, inventory::ledger::plan_deduction};
use rust_decimal::Decimal;
use store::{
    InMemoryKitchenStore, Ingredient, KitchenStore, MenuItem, RecipeLine, StockLot, UnitOfWork,
};

const ITEM: MenuItemId = MenuItemId::new(1);

fn lot(ingredient_id: IngredientId, days_ago: i64) -> StockLot {
    StockLot {
        id: StockLotId::new(),
        ingredient_id,
        unit: UnitOfMeasure::Milliliter,
        quantity: Decimal::from(500),
        cost: Decimal::ONE,
        delivery_date: Utc::now() - Duration::days(days_ago),
        created_on: Utc::now(),
    }
}

/// A menu item with `ingredients` recipe lines, each backed by `lots` lots.
async fn seeded_store(ingredients: i64, lots: i64) -> InMemoryKitchenStore {
    let store = InMemoryKitchenStore::new();
    let mut uow = store.begin().await.unwrap();
    uow.insert_menu_item(&MenuItem {
        id: ITEM,
        name: "Tasting menu".into(),
        description: None,
        price: Decimal::from(40),
        created_on: Utc::now(),
        on_menu: true,
    })
    .await
    .unwrap();
    for i in 1..=ingredients {
        let ingredient_id = IngredientId::new(i);
        uow.insert_ingredient(&Ingredient {
            id: ingredient_id,
            name: format!("Ingredient {i}"),
            description: None,
        })
        .await
        .unwrap();
        uow.insert_recipe_line(&RecipeLine {
            menu_item_id: ITEM,
            ingredient_id,
            quantity: Decimal::from(15),
            unit: UnitOfMeasure::Centiliter,
        })
        .await
        .unwrap();
        for days in 0..lots {
            uow.insert_stock_lot(&lot(ingredient_id, days)).await.unwrap();
        }
    }
    uow.commit().await.unwrap();
    store
}

fn bench_availability(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(seeded_store(8, 20));
    let service = MenuService::new(store);

    c.bench_function("domain/availability_8x20", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.availability(ITEM).await.unwrap();
            });
        });
    });
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/place_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = seeded_store(4, 5).await;
                let service = OrderService::new(store);
                service.place_order(ITEM).await.unwrap();
            });
        });
    });
}

fn bench_plan_deduction(c: &mut Criterion) {
    let lots: Vec<_> = (0..100).map(|days| lot(IngredientId::new(1), days)).collect();

    c.bench_function("domain/plan_deduction_100_lots", |b| {
        b.iter(|| {
            plan_deduction(
                IngredientId::new(1),
                &lots,
                UnitOfMeasure::Liter,
                Decimal::from(30),
            )
            .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_availability,
    bench_place_order,
    bench_plan_deduction
);
criterion_main!(benches);
