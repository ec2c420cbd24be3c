//! `/api/categories`

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use potu_core::{Category, NewCategory};
use serde_json::{json, Value};

use crate::error::{ApiJson, ApiPath, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", delete(destroy))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.catalog().list_categories().await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.catalog().create_category(new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn destroy(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    let category = state.catalog().delete_category(id).await?;
    Ok(Json(json!({
        "message": "Category deleted successfully",
        "category": category,
    })))
}
