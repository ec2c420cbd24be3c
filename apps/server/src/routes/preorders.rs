//! `/api/preorders`

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use potu_core::{ConvertRequest, OrderRequest, PreorderDetails};
use serde_json::{json, Value};

use super::invoice_response;
use crate::error::{ApiError, ApiJson, ApiPath, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).delete(destroy))
        .route("/{id}/kick-to-sell", post(convert))
        .route("/{id}/invoice", get(invoice))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PreorderDetails>>> {
    Ok(Json(state.orders().list_preorders().await?))
}

async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<PreorderDetails>> {
    Ok(Json(state.orders().get_preorder(id).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OrderRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let created = state.orders().create_preorder(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Pre-order created successfully",
            "preorderId": created.preorder_id,
            "customerId": created.customer_id,
            "emailSent": created.email_sent,
        })),
    ))
}

/// The body is optional; an empty request converts with the default
/// payment method.
async fn convert(State(state): State<AppState>, ApiPath(id): ApiPath<i64>, body: Bytes) -> ApiResult<Json<Value>> {
    let request: ConvertRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ConvertRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::validation(e.to_string()))?
    };
    let converted = state.orders().convert_preorder(id, request).await?;
    Ok(Json(json!({
        "message": "Pre-order converted to order successfully",
        "orderId": converted.order_id,
        "orderNumber": converted.order_number,
        "emailSent": converted.email_sent,
    })))
}

async fn destroy(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    state.orders().delete_preorder(id).await?;
    Ok(Json(json!({ "message": "Pre-order deleted successfully" })))
}

async fn invoice(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Response> {
    let order = state.orders().preorder_invoice(id).await?;
    Ok(invoice_response(&state, &order))
}
