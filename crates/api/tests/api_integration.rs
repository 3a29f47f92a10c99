//! Integration tests for the API server.

use std::sync::Arc;
use std::sync::OnceLock;

use api::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use common::{IngredientId, MenuItemId, UnitOfMeasure};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal_macros::dec;
use store::{
    InMemoryKitchenStore, Ingredient, KitchenStore, MenuItem, RecipeLine, UnitOfWork,
};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Menu item 1 "Salad" needs 300 ml of ingredient 1 "Lettuce". No stock.
async fn seeded_store() -> InMemoryKitchenStore {
    let store = InMemoryKitchenStore::new();
    let mut uow = store.begin().await.unwrap();
    uow.insert_menu_item(&MenuItem {
        id: MenuItemId::new(1),
        name: "Salad".into(),
        description: Some("Green salad".into()),
        price: dec!(7.50),
        created_on: Utc::now(),
        on_menu: true,
    })
    .await
    .unwrap();
    uow.insert_ingredient(&Ingredient {
        id: IngredientId::new(1),
        name: "Lettuce".into(),
        description: None,
    })
    .await
    .unwrap();
    uow.insert_recipe_line(&RecipeLine {
        menu_item_id: MenuItemId::new(1),
        ingredient_id: IngredientId::new(1),
        quantity: dec!(300),
        unit: UnitOfMeasure::Milliliter,
    })
    .await
    .unwrap();
    uow.commit().await.unwrap();
    store
}

async fn setup() -> (axum::Router, InMemoryKitchenStore) {
    let store = seeded_store().await;
    let state = Arc::new(AppState::new(store.clone(), 3));
    let app = api::create_app(state, get_metrics_handle());
    (app, store)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn ingest_lettuce(app: &axum::Router, milliliters: u32) -> serde_json::Value {
    let (status, json) = send(
        app,
        post_json(
            "/stock",
            serde_json::json!({
                "ingredient_id": 1,
                "unit": "milliliter",
                "quantity": milliliters.to_string(),
                "cost": "2.50"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup().await;
    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_menu_listing_and_detail() {
    let (app, _) = setup().await;

    let (status, json) = send(&app, get("/menu")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Salad");

    let (status, json) = send(&app, get("/menu/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ingredients"][0]["name"], "Lettuce");
    assert_eq!(json["ingredients"][0]["unit"], "milliliter");

    let (status, json) = send(&app, get("/menu/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("99"));
}

#[tokio::test]
async fn test_availability_follows_stock() {
    let (app, _) = setup().await;

    let (status, json) = send(&app, get("/menu/1/availability")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available_portions"], 0);

    ingest_lettuce(&app, 1000).await;
    let (_, json) = send(&app, get("/menu/1/availability")).await;
    assert_eq!(json["available_portions"], 3);
    assert_eq!(json["ingredients"][0]["available_quantity"], "1000");
    assert_eq!(json["ingredients"][0]["required_quantity"], "300");

    let (status, _) = send(&app, get("/menu/42/availability")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_place_order_until_stock_runs_out() {
    let (app, store) = setup().await;
    ingest_lettuce(&app, 1000).await;

    for _ in 0..3 {
        let (status, json) =
            send(&app, post_json("/orders", serde_json::json!({ "menu_id": 1 }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["menu_id"], 1);

        let (status, fetched) = send(&app, get(&format!("/orders/{}", json["id"].as_str().unwrap()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, json);
    }

    let (status, json) =
        send(&app, post_json("/orders", serde_json::json!({ "menu_id": 1 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("Insufficient stock"));

    let (_, orders) = send(&app, get("/orders")).await;
    assert_eq!(orders.as_array().unwrap().len(), 3);
    assert_eq!(store.order_count().await, 3);

    let (_, lots) = send(&app, get("/ingredients/1/stock")).await;
    assert_eq!(lots[0]["quantity"], "100");
}

#[tokio::test]
async fn test_place_order_for_unknown_item() {
    let (app, _) = setup().await;
    let (status, _) = send(&app, post_json("/orders", serde_json::json!({ "menu_id": 7 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_commit_returns_500_and_keeps_stock() {
    let (app, store) = setup().await;
    ingest_lettuce(&app, 1000).await;
    store.set_fail_on_commit(true);

    let (status, json) =
        send(&app, post_json("/orders", serde_json::json!({ "menu_id": 1 }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].is_string());

    store.set_fail_on_commit(false);
    assert_eq!(store.order_count().await, 0);
    let (_, lots) = send(&app, get("/stock")).await;
    assert_eq!(lots[0]["quantity"], "1000");
}

#[tokio::test]
async fn test_ingest_validation() {
    let (app, store) = setup().await;

    let (status, _) = send(
        &app,
        post_json(
            "/stock",
            serde_json::json!({ "ingredient_id": 1, "unit": "milliliter", "quantity": "-5", "cost": "1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        post_json(
            "/stock",
            serde_json::json!({ "ingredient_id": 1, "unit": "gallon", "quantity": "5", "cost": "1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("gallon"));

    let (status, _) = send(
        &app,
        post_json(
            "/stock",
            serde_json::json!({
                "ingredient_id": 1,
                "unit": "liter",
                "quantity": "79228162514264337593543950335",
                "cost": "1"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/stock",
            serde_json::json!({ "ingredient_id": 9, "unit": "liter", "quantity": "5", "cost": "1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(store.stock_lot_count().await, 0);
}

#[tokio::test]
async fn test_stock_lot_lookup() {
    let (app, _) = setup().await;
    let lot = ingest_lettuce(&app, 500).await;
    assert_eq!(lot["delivery_date"], lot["created_on"]);

    let (status, json) = send(&app, get(&format!("/stock/{}", lot["id"].as_str().unwrap()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, lot);

    let (status, _) = send(&app, get("/stock/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/stock/00000000-0000-0000-0000-000000000000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/ingredients/5/stock")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manual_deduction() {
    let (app, _) = setup().await;
    ingest_lettuce(&app, 500).await;

    let (status, json) = send(
        &app,
        post_json(
            "/ingredients/1/stock/deduct",
            serde_json::json!({ "quantity": "-0.2", "unit": "liter" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deducted"], "0.2");

    let (status, _) = send(
        &app,
        post_json(
            "/ingredients/1/stock/deduct",
            serde_json::json!({ "quantity": "10", "unit": "liter" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/ingredients/1/stock/deduct",
            serde_json::json!({ "quantity": "-1", "unit": "liter" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, lots) = send(&app, get("/ingredients/1/stock")).await;
    assert_eq!(lots[0]["quantity"], "300");
}

#[tokio::test]
async fn test_reports() {
    let (app, _) = setup().await;
    ingest_lettuce(&app, 1000).await;
    send(&app, post_json("/orders", serde_json::json!({ "menu_id": 1 }))).await;

    let (status, json) = send(&app, get("/reports/stock")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rows"][0]["lot_count"], 1);
    assert_eq!(json["rows"][0]["total_liters"], "0.7");

    let (status, json) = send(&app, get("/reports/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_orders"], 1);
    assert_eq!(json["rows"][0]["revenue"], "7.50");
}

#[tokio::test]
async fn test_ingredients_listing() {
    let (app, _) = setup().await;
    let (status, json) = send(&app, get("/ingredients")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["name"], "Lettuce");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup().await;
    ingest_lettuce(&app, 300).await;
    send(&app, post_json("/orders", serde_json::json!({ "menu_id": 1 }))).await;

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_placed_total"));
}
