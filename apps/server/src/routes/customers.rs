//! `/api/customers`

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use potu_core::reports::{CustomerWithOrderCount, CustomerWithProducts};
use potu_core::{Customer, CustomerFields, CustomerPatch, Order};
use serde_json::{json, Value};

use crate::error::{ApiJson, ApiPath, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/with-products", get(with_products))
        .route("/{id}", get(show).put(update).delete(destroy))
        .route("/{id}/orders", get(orders))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<CustomerWithOrderCount>>> {
    Ok(Json(state.customers().list().await?))
}

async fn with_products(State(state): State<AppState>) -> ApiResult<Json<Vec<CustomerWithProducts>>> {
    Ok(Json(state.customers().with_products().await?))
}

async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Customer>> {
    Ok(Json(state.customers().get(id).await?))
}

async fn orders(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.customers().orders(id).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(fields): ApiJson<CustomerFields>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.customers().create(fields).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<CustomerPatch>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.customers().update(id, patch).await?))
}

async fn destroy(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    let customer = state.customers().delete(id).await?;
    Ok(Json(json!({
        "message": "Customer deleted successfully",
        "customer": customer,
    })))
}
