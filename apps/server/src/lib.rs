//! # potu-server: HTTP API for Potu POS
//!
//! The JSON API the React frontend talks to.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP request                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TraceLayer ─► CorsLayer ─► routes/*  (parse, call, shape JSON)         │
//! │                                │                                        │
//! │                                ▼                                        │
//! │                        services/*  (business rules, transactions)       │
//! │                          │                  │                           │
//! │                          ▼                  ▼                           │
//! │                       potu-db          notification (after commit)      │
//! │                                                                         │
//! │  Errors at any step become ApiError → { "error": ..., "code": ... }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Layered server configuration
//! - [`error`] - API error type and JSON extractor
//! - [`state`] - Shared handler state
//! - [`services`] - Catalog, customers, order engine, reports
//! - [`notification`] - Invoice PDF and email delivery
//! - [`routes`] - axum handlers

pub mod config;
pub mod error;
pub mod notification;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{ServerConfig, StoreInfo};
pub use error::{ApiError, ErrorCode};
pub use state::AppState;

/// Builds the application router.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
