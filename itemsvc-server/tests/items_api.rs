//! End-to-end item API tests against a real PostgreSQL database
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p itemsvc-server -- --ignored

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use itemsvc_server::db::schema;
use itemsvc_server::models::date_as_timestamp;
use itemsvc_server::{build_router, create_pool, PoolSettings, ServerConfig};

fn connect_options() -> PgConnectOptions {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    url.parse().expect("invalid DATABASE_URL")
}

async fn setup() -> (PgPool, Router) {
    let settings = PoolSettings::new(connect_options())
        .max_connections(3)
        .acquire_timeout(Duration::from_secs(2));

    let pool = create_pool(&settings).await.expect("pool creation failed");
    schema::ensure(&pool).await.expect("schema bootstrap failed");

    let app = build_router(pool.clone(), &ServerConfig::default());
    (pool, app)
}

/// Positive id unlikely to collide across test runs.
fn fresh_id() -> i64 {
    (Uuid::new_v4().as_u128() >> 66) as i64
}

fn fresh_creator() -> String {
    format!("user-{}", Uuid::new_v4())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, id: i64, name: &str, description: &str, creator: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/items",
        Some(json!({
            "id": id,
            "name": name,
            "description": description,
            "username": creator,
            "CreatedBy": "ignored"
        })),
    )
    .await
}

async fn store_date(pool: &PgPool) -> NaiveDate {
    let (today,): (NaiveDate,) = sqlx::query_as("SELECT current_date")
        .fetch_one(pool)
        .await
        .unwrap();
    today
}

/// Every pooled connection should be back in the idle set.
async fn assert_all_connections_idle(pool: &PgPool) {
    for _ in 0..50 {
        if pool.num_idle() == pool.size() as usize {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "connections leaked: size={} idle={}",
        pool.size(),
        pool.num_idle()
    );
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_then_get_returns_stored_row() {
    let (pool, app) = setup().await;
    let id = fresh_id();
    let creator = fresh_creator();

    let (status, created) = create(&app, id, "groceries", "milk, eggs", &creator).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["id"], id);
    assert_eq!(created["createdby"], creator.as_str());

    let (status, fetched) = send(&app, "GET", &format!("/itemsForId/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "groceries");
    assert_eq!(fetched["description"], "milk, eggs");
    assert_eq!(fetched["createdby"], creator.as_str());

    let today = date_as_timestamp(store_date(&pool).await, &chrono::Local).unwrap();
    assert!(today.ends_with(".000Z"));
    assert_eq!(fetched["createddate"], today.as_str());
    assert_eq!(created, fetched);
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_id_is_500_and_first_row_survives() {
    let (_pool, app) = setup().await;
    let id = fresh_id();
    let creator = fresh_creator();

    let (status, first) = create(&app, id, "first", "original", &creator).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = create(&app, id, "second", "overwrite", "someone-else").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));

    let (_, stored) = send(&app, "GET", &format!("/itemsForId/{id}"), None).await;
    assert_eq!(stored, first);
}

#[tokio::test]
#[ignore = "requires database"]
async fn list_by_creator_is_filtered_and_ordered() {
    let (_pool, app) = setup().await;
    let creator = fresh_creator();
    let base = fresh_id();

    for offset in [5, 1, 3] {
        let (status, _) = create(&app, base + offset, "n", "d", &creator).await;
        assert_eq!(status, StatusCode::OK);
    }
    let neighbour = format!("{creator}-other");
    create(&app, base + 2, "n", "d", &neighbour).await;

    let (status, body) = send(&app, "GET", &format!("/items/{creator}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![base + 1, base + 3, base + 5]);

    let (status, body) = send(&app, "GET", &format!("/items/{}", fresh_creator()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
#[ignore = "requires database"]
async fn unknown_id_is_404_everywhere() {
    let (_pool, app) = setup().await;
    let id = fresh_id();
    let not_found = json!({ "error": "Item not found" });

    let (status, body) = send(&app, "GET", &format!("/itemsForId/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/items/{id}"),
        Some(json!({ "name": "x", "description": "y" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);

    let (status, body) = send(&app, "DELETE", &format!("/items/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_overwrites_both_fields() {
    let (_pool, app) = setup().await;
    let id = fresh_id();
    let creator = fresh_creator();
    let (_, created) = create(&app, id, "before", "keep me?", &creator).await;

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/items/{id}"),
        Some(json!({ "name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "X");
    assert_eq!(updated["description"], Value::Null);
    assert_eq!(updated["createdby"], created["createdby"]);
    assert_eq!(updated["createddate"], created["createddate"]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn second_delete_is_404() {
    let (_pool, app) = setup().await;
    let id = fresh_id();
    create(&app, id, "n", "d", &fresh_creator()).await;

    let (status, body) = send(&app, "DELETE", &format!("/items/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Item deleted successfully" }));

    let (status, _) = send(&app, "GET", &format!("/itemsForId/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/items/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn connections_return_to_pool_after_failures() {
    let (pool, app) = setup().await;
    let id = fresh_id();
    let creator = fresh_creator();
    create(&app, id, "n", "d", &creator).await;

    // Far more failing requests than the pool has connections.
    for _ in 0..10 {
        let (status, _) = create(&app, id, "dup", "dup", &creator).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let (status, _) = send(&app, "GET", &format!("/itemsForId/{}", fresh_id()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    assert_all_connections_idle(&pool).await;

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let app = app.clone();
            let uri = format!("/itemsForId/{id}");
            tokio::spawn(async move { send(&app, "GET", &uri, None).await.0 })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.expect("task panicked"), StatusCode::OK);
    }
    assert_all_connections_idle(&pool).await;
    assert!(pool.size() <= 3);
}

#[tokio::test]
#[ignore = "requires database"]
async fn store_coerces_loosely_typed_fields() {
    let (_pool, app) = setup().await;
    let id = fresh_id();
    let creator = fresh_creator();

    let (status, created) = send(
        &app,
        "POST",
        "/items",
        Some(json!({
            "id": id.to_string(),
            "name": 5,
            "description": "d",
            "username": creator
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["id"], id);
    assert_eq!(created["name"], "5");

    let (status, body) = send(
        &app,
        "POST",
        "/items",
        Some(json!({ "id": "not-a-number", "name": "n", "username": creator })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));

    let (status, _) = send(&app, "GET", "/itemsForId/not-a-number", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_without_body_clears_both_fields() {
    let (_pool, app) = setup().await;
    let id = fresh_id();
    create(&app, id, "name", "description", &fresh_creator()).await;

    let (status, updated) = send(&app, "PUT", &format!("/items/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], Value::Null);
    assert_eq!(updated["description"], Value::Null);

    let (_, stored) = send(&app, "GET", &format!("/itemsForId/{id}"), None).await;
    assert_eq!(stored, updated);
}

#[tokio::test]
#[ignore = "requires database"]
async fn externally_created_table_with_narrow_columns() {
    let admin = create_pool(&PoolSettings::new(connect_options()).max_connections(1))
        .await
        .expect("pool creation failed");
    let schema_name = format!("legacy_{}", Uuid::new_v4().simple());

    sqlx::query(&format!("CREATE SCHEMA {schema_name}"))
        .execute(&admin)
        .await
        .unwrap();
    sqlx::query(&format!(
        "CREATE TABLE {schema_name}.items (
            id INTEGER PRIMARY KEY,
            name VARCHAR(255),
            description VARCHAR(1000),
            createdby VARCHAR(100),
            createddate DATE
        )"
    ))
    .execute(&admin)
    .await
    .unwrap();

    let connect = connect_options().options([("search_path", schema_name.as_str())]);
    let pool = create_pool(&PoolSettings::new(connect).max_connections(2))
        .await
        .expect("pool creation failed");
    let app = build_router(pool.clone(), &ServerConfig::default());

    let (status, created) = create(&app, 42, "n", "d", "legacy-user").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["id"], 42);

    let (status, listed) = send(&app, "GET", "/items/legacy-user", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));

    let (status, _) = send(&app, "DELETE", "/items/42", None).await;
    assert_eq!(status, StatusCode::OK);

    pool.close().await;
    sqlx::query(&format!("DROP SCHEMA {schema_name} CASCADE"))
        .execute(&admin)
        .await
        .unwrap();
}
