//! `/api/products`

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use potu_core::{NewProduct, Product, ProductPatch, ProductWithStock};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/alerts/low-stock", get(low_stock))
        .route("/{id}", get(show).put(update).delete(destroy))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductWithStock>>> {
    Ok(Json(state.catalog().list_products().await?))
}

async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<ProductWithStock>> {
    Ok(Json(state.catalog().get_product(id).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<ProductWithStock>)> {
    let product = state.catalog().create_product(new).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> ApiResult<Json<ProductWithStock>> {
    let product: Product = state.catalog().update_product(id, patch).await?;
    Ok(Json(product.into()))
}

async fn destroy(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    let product = state.catalog().delete_product(id).await?;
    Ok(Json(json!({
        "message": "Product deleted successfully",
        "product": product,
    })))
}

#[derive(Debug, Deserialize)]
struct LowStockParams {
    threshold: Option<i64>,
}

async fn low_stock(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<LowStockParams>,
) -> ApiResult<Json<Vec<ProductWithStock>>> {
    Ok(Json(state.catalog().low_stock(params.threshold).await?))
}
