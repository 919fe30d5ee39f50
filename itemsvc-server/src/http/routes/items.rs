//! Item endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::db::repos::ItemRepo;
use crate::http::error::ApiError;
use crate::http::extractors::JsonFields;
use crate::http::server::AppState;
use crate::models::{CreateItemRequest, Item, MessageResponse, NewItem, UpdateItemRequest};

pub const DELETED_MESSAGE: &str = "Item deleted successfully";

/// POST /items - create an item with a caller-supplied id
async fn create_item(
    State(state): State<Arc<AppState>>,
    JsonFields(fields): JsonFields,
) -> Result<Json<Item>, ApiError> {
    let req = CreateItemRequest::from_fields(&fields);
    let item = ItemRepo::new(&state.pool).create(NewItem::from(req)).await?;
    Ok(Json(item))
}

/// GET /items/{username} - every item recorded under a creator
async fn list_items_by_creator(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = ItemRepo::new(&state.pool).list_by_creator(&username).await?;
    Ok(Json(items))
}

/// GET /itemsForId/{id}
async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let item = ItemRepo::new(&state.pool).get(&id).await?;
    Ok(Json(item))
}

/// PUT /items/{id} - overwrite name and description
async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonFields(fields): JsonFields,
) -> Result<Json<Item>, ApiError> {
    let req = UpdateItemRequest::from_fields(&fields);
    let item = ItemRepo::new(&state.pool)
        .update(&id, req.name, req.description)
        .await?;
    Ok(Json(item))
}

/// DELETE /items/{id}
async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    ItemRepo::new(&state.pool).delete(&id).await?;
    Ok(Json(MessageResponse {
        message: DELETED_MESSAGE,
    }))
}

/// Item routes
///
/// `/items/{key}` is one route: GET reads the segment as a creator name,
/// PUT and DELETE read it as an item id.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", post(create_item))
        .route(
            "/items/{key}",
            get(list_items_by_creator)
                .put(update_item)
                .delete(delete_item),
        )
        .route("/itemsForId/{id}", get(get_item))
}
