//! `/api/reports`

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use potu_core::reports::{CategorySales, CustomerSpend, DashboardStats, InventoryLine, SalesReport};
use serde::Deserialize;

use crate::error::{ApiQuery, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/inventory", get(inventory))
        .route("/sales", get(sales))
        .route("/customers", get(customers))
        .route("/category-sales", get(category_sales))
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.reports().dashboard().await?))
}

async fn inventory(State(state): State<AppState>) -> ApiResult<Json<Vec<InventoryLine>>> {
    Ok(Json(state.reports().inventory().await?))
}

/// Accepts `startDate`/`endDate` as well as `start_date`/`end_date`.
#[derive(Debug, Default, Deserialize)]
struct SalesParams {
    #[serde(alias = "startDate")]
    start_date: Option<String>,
    #[serde(alias = "endDate")]
    end_date: Option<String>,
}

async fn sales(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SalesParams>,
) -> ApiResult<Json<SalesReport>> {
    let report = state
        .reports()
        .sales(params.start_date.as_deref(), params.end_date.as_deref())
        .await?;
    Ok(Json(report))
}

async fn customers(State(state): State<AppState>) -> ApiResult<Json<Vec<CustomerSpend>>> {
    Ok(Json(state.reports().customers().await?))
}

async fn category_sales(State(state): State<AppState>) -> ApiResult<Json<Vec<CategorySales>>> {
    Ok(Json(state.reports().category_sales().await?))
}
