//! # HTTP Routes
//!
//! ```text
//! /health                                  GET
//! /api/products        /{id}  /alerts/low-stock
//! /api/categories      /{id}
//! /api/customers       /{id}  /{id}/orders  /with-products
//! /api/orders          /{id}  /{id}/invoice
//! /api/preorders       /{id}  /{id}/kick-to-sell  /{id}/invoice
//! /api/reports         /dashboard /inventory /sales /customers /category-sales
//! ```
//!
//! Handlers parse the request, call one service method and shape the
//! JSON. Errors leave as [`ApiError`](crate::error::ApiError).

mod categories;
mod customers;
mod health;
mod orders;
mod preorders;
mod products;
mod reports;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Router;
use potu_core::numbering::invoice_file_name;
use potu_core::OrderDetails;

use crate::notification::render_invoice;
use crate::state::AppState;

/// Every `/api` route plus `/health`.
pub fn router() -> Router<AppState> {
    let api = Router::new()
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/customers", customers::router())
        .nest("/orders", orders::router())
        .nest("/preorders", preorders::router())
        .nest("/reports", reports::router());

    Router::new()
        .nest("/api", api)
        .merge(health::router())
}

/// Renders an order's invoice as an inline PDF response.
pub(crate) fn invoice_response(state: &AppState, order: &OrderDetails) -> Response {
    let pdf = render_invoice(&state.store, order);
    let disposition = format!("inline; filename={}", invoice_file_name(&order.order.order_number));
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response()
}
