//! `/api/orders`

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use potu_core::{Order, OrderDetails, OrderPatch, OrderRequest};
use serde_json::{json, Value};

use super::invoice_response;
use crate::error::{ApiJson, ApiPath, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(destroy))
        .route("/{id}/invoice", get(invoice))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<OrderDetails>>> {
    Ok(Json(state.orders().list_orders().await?))
}

async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<OrderDetails>> {
    Ok(Json(state.orders().get_order(id).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OrderRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let created = state.orders().create_order(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Order created successfully",
            "orderId": created.order_id,
            "customerId": created.customer_id,
            "emailSent": created.email_sent,
        })),
    ))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders().update_order(id, patch).await?))
}

async fn destroy(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    state.orders().delete_order(id).await?;
    Ok(Json(json!({ "message": "Order deleted successfully" })))
}

async fn invoice(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Response> {
    let order = state.orders().get_order(id).await?;
    Ok(invoice_response(&state, &order))
}
