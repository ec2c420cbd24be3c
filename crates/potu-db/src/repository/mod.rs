//! # Repository Module
//!
//! Typed access to the record store collections.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service                                                               │
//! │       │                                                                 │
//! │       │  tx.products().adjust_sold_items(1, 2)                         │
//! │       ▼                                                                 │
//! │  ProductRepository<'_>                                                 │
//! │  ├── list / get_by_id                                                  │
//! │  ├── insert(&ProductFields)      → Product                             │
//! │  ├── update(id, &ProductPatch)   → Product                             │
//! │  └── adjust_sold_items(id, delta)                                      │
//! │       │                                                                 │
//! │       │  Record (JSON object) via serde                                │
//! │       ▼                                                                 │
//! │  dyn RecordAccess  (Database or StoreTx)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A repository borrows whatever store handle created it, so the same
//! repository code works auto-committed or inside a transaction.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Products and sold-item accounting
//! - [`CategoryRepository`] - Categories
//! - [`CustomerRepository`] - Customers and phone lookup
//! - [`OrderRepository`] - Orders and their line items
//! - [`PreorderRepository`] - Pre-orders and their line items

pub mod category;
pub mod customer;
pub mod order;
pub mod preorder;
pub mod product;

pub use category::CategoryRepository;
pub use customer::CustomerRepository;
pub use order::OrderRepository;
pub use preorder::PreorderRepository;
pub use product::ProductRepository;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DbError, DbResult};
use crate::store::{from_record, to_record, Collection, Record, RecordAccess};

// =============================================================================
// Shared Helpers
// =============================================================================

pub(crate) async fn load_all<T: DeserializeOwned>(
    store: &dyn RecordAccess,
    collection: Collection,
) -> DbResult<Vec<T>> {
    store
        .get_all(collection)
        .await?
        .into_iter()
        .map(|r| from_record(collection, r))
        .collect()
}

pub(crate) async fn load_one<T: DeserializeOwned>(
    store: &dyn RecordAccess,
    collection: Collection,
    id: i64,
) -> DbResult<Option<T>> {
    store
        .get_by_id(collection, id)
        .await?
        .map(|r| from_record(collection, r))
        .transpose()
}

pub(crate) async fn load_where<T: DeserializeOwned>(
    store: &dyn RecordAccess,
    collection: Collection,
    predicate: &(dyn Fn(&Record) -> bool + Send + Sync),
) -> DbResult<Vec<T>> {
    store
        .query(collection, predicate)
        .await?
        .into_iter()
        .map(|r| from_record(collection, r))
        .collect()
}

/// Inserts `fields` and reads the stored record back.
pub(crate) async fn insert_and_load<T: DeserializeOwned, F: Serialize + Sync>(
    store: &dyn RecordAccess,
    collection: Collection,
    fields: &F,
) -> DbResult<T> {
    let inserted = store.insert(collection, to_record(collection, fields)?).await?;
    load_one(store, collection, inserted.id)
        .await?
        .ok_or_else(|| DbError::record_not_found(collection, inserted.id))
}

/// Merges `fields` into record `id` and reads it back.
/// Fails with `RecordNotFound` when `id` doesn't exist.
pub(crate) async fn update_and_load<T: DeserializeOwned, F: Serialize + Sync>(
    store: &dyn RecordAccess,
    collection: Collection,
    id: i64,
    fields: &F,
) -> DbResult<T> {
    store.update(collection, id, to_record(collection, fields)?).await?;
    load_one(store, collection, id)
        .await?
        .ok_or_else(|| DbError::record_not_found(collection, id))
}

/// True when `record[field]` is the integer `id`.
pub(crate) fn refers_to(record: &Record, field: &str, id: i64) -> bool {
    record.get(field).and_then(Value::as_i64) == Some(id)
}
