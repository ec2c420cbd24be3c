//! # potu-db: Record Store for Potu POS
//!
//! Named collections of JSON records in SQLite, typed repositories over
//! them, and store-wide transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Potu POS Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /api/orders)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Service (order engine) ── business rules from potu-core               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     potu-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ ProductRepo   │    │  (embedded)  │  │   │
//! │  │   │   StoreTx     │◄───│ OrderRepo     │    │ 0001_*.sql   │  │   │
//! │  │   │  (store.rs)   │    │ PreorderRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (./potu.db) or in-memory for tests                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`store`] - Collections, the [`RecordAccess`] trait, transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Typed repositories per collection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use potu_db::{Database, DbConfig, RecordAccess};
//!
//! let db = Database::new(DbConfig::new("./potu.db")).await?;
//!
//! let products = db.products().list().await?;
//!
//! let tx = db.begin().await?;
//! tx.products().adjust_sold_items(1, 2).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{Collection, Inserted, Record, RecordAccess, StoreTx};

pub use repository::{
    CategoryRepository, CustomerRepository, OrderRepository, PreorderRepository, ProductRepository,
};
