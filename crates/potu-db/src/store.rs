//! # Record Store
//!
//! Named collections of JSON records with integer ids, on top of SQLite.
//!
//! ## Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Collection "products"              SQLite table "products"            │
//! │                                                                         │
//! │  { "id": 1,                     ┌────┬──────────────────┬──────┬──────┐│
//! │    "item_name": "Headphones", ─►│ id │ data (JSON)      │ crt  │ upd  ││
//! │    "total_stock": 50,           ├────┼──────────────────┼──────┼──────┤│
//! │    "created_at": "...",         │ 1  │ {"item_name":..} │ ...  │ ...  ││
//! │    "updated_at": "..." }        └────┴──────────────────┴──────┴──────┘│
//! │                                                                         │
//! │  id, created_at, updated_at are owned by the store. Callers never set   │
//! │  them; values passed in for those keys are dropped.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//! | Operation   | Result               | Missing id          |
//! |-------------|----------------------|---------------------|
//! | `get_all`   | records by id        |                     |
//! | `get_by_id` | `Option<Record>`     | `None`              |
//! | `insert`    | `{id, changes: 1}`   | id = max(id)+1 or 1 |
//! | `update`    | `changes`            | `RecordNotFound`    |
//! | `delete`    | `changes`            | `0`, no error       |
//! | `query`     | filtered `get_all`   |                     |
//!
//! ## Writers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database (auto-commit)            StoreTx (one transaction)           │
//! │     insert ─┐                         begin() ── takes writer lock     │
//! │     update ─┼─► writer lock ─► tx     insert, update, delete ...       │
//! │     delete ─┘   per call              commit() ── releases lock        │
//! │                                                                         │
//! │  Reads through Database never wait for the writer lock.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Every write is committed with `synchronous = FULL` before it returns.

use std::fmt;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::{
    CategoryRepository, CustomerRepository, OrderRepository, PreorderRepository, ProductRepository,
};

/// A record body: a JSON object.
pub type Record = Map<String, Value>;

/// Keys the store owns on every record.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

// =============================================================================
// Collections
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Categories,
    Customers,
    Orders,
    OrderItems,
    Preorders,
    PreorderItems,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Products,
        Collection::Categories,
        Collection::Customers,
        Collection::Orders,
        Collection::OrderItems,
        Collection::Preorders,
        Collection::PreorderItems,
    ];

    /// Backing table name. Also the collection's public name.
    pub const fn table(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Categories => "categories",
            Collection::Customers => "customers",
            Collection::Orders => "orders",
            Collection::OrderItems => "order_items",
            Collection::Preorders => "preorders",
            Collection::PreorderItems => "preorder_items",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Result of an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    pub id: i64,
    pub changes: u64,
}

// =============================================================================
// Record <-> Type Conversion
// =============================================================================

/// Serializes a value into a record body. The value must serialize to an object.
pub fn to_record<T: Serialize>(collection: Collection, value: &T) -> DbResult<Record> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DbError::serialization(collection, "expected a JSON object")),
        Err(e) => Err(DbError::serialization(collection, e)),
    }
}

/// Deserializes a stored record into a typed value.
pub fn from_record<T: DeserializeOwned>(collection: Collection, record: Record) -> DbResult<T> {
    serde_json::from_value(Value::Object(record)).map_err(|e| DbError::serialization(collection, e))
}

// =============================================================================
// Access Trait
// =============================================================================

/// The record store operations, shared by [`Database`] and [`StoreTx`].
///
/// Services are written against this trait so the same code runs
/// auto-committed or inside one transaction.
#[async_trait]
pub trait RecordAccess: Send + Sync {
    async fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>>;

    async fn get_by_id(&self, collection: Collection, id: i64) -> DbResult<Option<Record>>;

    /// Inserts `fields` with the next id and fresh timestamps.
    async fn insert(&self, collection: Collection, fields: Record) -> DbResult<Inserted>;

    /// Merges `fields` into the stored record and restamps `updated_at`.
    async fn update(&self, collection: Collection, id: i64, fields: Record) -> DbResult<u64>;

    async fn delete(&self, collection: Collection, id: i64) -> DbResult<u64>;

    /// Linear filter over `get_all`.
    async fn query(
        &self,
        collection: Collection,
        predicate: &(dyn for<'r> Fn(&'r Record) -> bool + Send + Sync),
    ) -> DbResult<Vec<Record>> {
        let all = self.get_all(collection).await?;
        Ok(all.into_iter().filter(|r| predicate(r)).collect())
    }

    fn products(&self) -> ProductRepository<'_>
    where
        Self: Sized,
    {
        ProductRepository::new(self)
    }

    fn categories(&self) -> CategoryRepository<'_>
    where
        Self: Sized,
    {
        CategoryRepository::new(self)
    }

    fn customers(&self) -> CustomerRepository<'_>
    where
        Self: Sized,
    {
        CustomerRepository::new(self)
    }

    fn orders(&self) -> OrderRepository<'_>
    where
        Self: Sized,
    {
        OrderRepository::new(self)
    }

    fn preorders(&self) -> PreorderRepository<'_>
    where
        Self: Sized,
    {
        PreorderRepository::new(self)
    }
}

// =============================================================================
// Raw Operations (connection level)
// =============================================================================

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn strip_reserved(mut fields: Record) -> Record {
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }
    fields
}

type Row = (i64, String, String, String);

fn assemble(collection: Collection, (id, data, created_at, updated_at): Row) -> DbResult<Record> {
    let mut record: Record =
        serde_json::from_str(&data).map_err(|e| DbError::serialization(collection, e))?;
    record.insert("id".into(), Value::from(id));
    record.insert("created_at".into(), Value::String(created_at));
    record.insert("updated_at".into(), Value::String(updated_at));
    Ok(record)
}

fn encode(collection: Collection, body: &Record) -> DbResult<String> {
    serde_json::to_string(body).map_err(|e| DbError::serialization(collection, e))
}

pub(crate) async fn fetch_all(conn: &mut SqliteConnection, collection: Collection) -> DbResult<Vec<Record>> {
    let sql = format!(
        "SELECT id, data, created_at, updated_at FROM {} ORDER BY id",
        collection.table()
    );
    let rows: Vec<Row> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
    rows.into_iter().map(|row| assemble(collection, row)).collect()
}

pub(crate) async fn fetch_one(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: i64,
) -> DbResult<Option<Record>> {
    let sql = format!(
        "SELECT id, data, created_at, updated_at FROM {} WHERE id = ?",
        collection.table()
    );
    let row: Option<Row> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut *conn).await?;
    row.map(|row| assemble(collection, row)).transpose()
}

pub(crate) async fn insert_record(
    conn: &mut SqliteConnection,
    collection: Collection,
    fields: Record,
) -> DbResult<Inserted> {
    let table = collection.table();
    let next_id: i64 = sqlx::query_scalar(&format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", table))
        .fetch_one(&mut *conn)
        .await?;

    let body = strip_reserved(fields);
    let now = timestamp();
    let result = sqlx::query(&format!(
        "INSERT INTO {} (id, data, created_at, updated_at) VALUES (?, ?, ?, ?)",
        table
    ))
    .bind(next_id)
    .bind(encode(collection, &body)?)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    debug!(collection = %collection, id = next_id, "Inserted record");
    Ok(Inserted {
        id: next_id,
        changes: result.rows_affected(),
    })
}

pub(crate) async fn update_record(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: i64,
    fields: Record,
) -> DbResult<u64> {
    let table = collection.table();
    let stored: Option<String> = sqlx::query_scalar(&format!("SELECT data FROM {} WHERE id = ?", table))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(stored) = stored else {
        return Err(DbError::record_not_found(collection, id));
    };

    let mut body: Record =
        serde_json::from_str(&stored).map_err(|e| DbError::serialization(collection, e))?;
    body.extend(strip_reserved(fields));

    let result = sqlx::query(&format!("UPDATE {} SET data = ?, updated_at = ? WHERE id = ?", table))
        .bind(encode(collection, &body)?)
        .bind(timestamp())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    debug!(collection = %collection, id = id, "Updated record");
    Ok(result.rows_affected())
}

pub(crate) async fn delete_record(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: i64,
) -> DbResult<u64> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", collection.table()))
        .bind(id)
        .execute(&mut *conn)
        .await?;

    debug!(collection = %collection, id = id, changes = result.rows_affected(), "Deleted record");
    Ok(result.rows_affected())
}

pub(crate) async fn clear_collection(conn: &mut SqliteConnection, collection: Collection) -> DbResult<u64> {
    let result = sqlx::query(&format!("DELETE FROM {}", collection.table()))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

// =============================================================================
// Auto-commit Access
// =============================================================================

#[async_trait]
impl RecordAccess for Database {
    async fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>> {
        let mut conn = self.pool().acquire().await?;
        fetch_all(&mut conn, collection).await
    }

    async fn get_by_id(&self, collection: Collection, id: i64) -> DbResult<Option<Record>> {
        let mut conn = self.pool().acquire().await?;
        fetch_one(&mut conn, collection, id).await
    }

    async fn insert(&self, collection: Collection, fields: Record) -> DbResult<Inserted> {
        let tx = self.begin().await?;
        let inserted = tx.insert(collection, fields).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn update(&self, collection: Collection, id: i64, fields: Record) -> DbResult<u64> {
        let tx = self.begin().await?;
        let changes = tx.update(collection, id, fields).await?;
        tx.commit().await?;
        Ok(changes)
    }

    async fn delete(&self, collection: Collection, id: i64) -> DbResult<u64> {
        let tx = self.begin().await?;
        let changes = tx.delete(collection, id).await?;
        tx.commit().await?;
        Ok(changes)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A write transaction over the whole store.
///
/// Holds the single writer lock from [`Database::begin`] until it is
/// committed or dropped. Dropping without [`StoreTx::commit`] rolls back.
pub struct StoreTx {
    tx: Mutex<Transaction<'static, Sqlite>>,
    _writer: OwnedMutexGuard<()>,
}

impl StoreTx {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, writer: OwnedMutexGuard<()>) -> Self {
        StoreTx {
            tx: Mutex::new(tx),
            _writer: writer,
        }
    }

    /// Commits every write made through this transaction.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .into_inner()
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Removes every record from every collection.
    pub async fn clear_all(&self) -> DbResult<u64> {
        let mut tx = self.tx.lock().await;
        let mut removed = 0;
        for collection in Collection::ALL {
            removed += clear_collection(&mut **tx, collection).await?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl RecordAccess for StoreTx {
    async fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>> {
        let mut tx = self.tx.lock().await;
        fetch_all(&mut **tx, collection).await
    }

    async fn get_by_id(&self, collection: Collection, id: i64) -> DbResult<Option<Record>> {
        let mut tx = self.tx.lock().await;
        fetch_one(&mut **tx, collection, id).await
    }

    async fn insert(&self, collection: Collection, fields: Record) -> DbResult<Inserted> {
        let mut tx = self.tx.lock().await;
        insert_record(&mut **tx, collection, fields).await
    }

    async fn update(&self, collection: Collection, id: i64, fields: Record) -> DbResult<u64> {
        let mut tx = self.tx.lock().await;
        update_record(&mut **tx, collection, id, fields).await
    }

    async fn delete(&self, collection: Collection, id: i64) -> DbResult<u64> {
        let mut tx = self.tx.lock().await;
        delete_record(&mut **tx, collection, id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use serde_json::json;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn fields(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids_and_timestamps() {
        let db = test_db().await;

        let first = db
            .insert(Collection::Categories, fields(json!({ "name": "Electronics" })))
            .await
            .unwrap();
        let second = db
            .insert(Collection::Categories, fields(json!({ "name": "Kitchen" })))
            .await
            .unwrap();

        assert_eq!(first, Inserted { id: 1, changes: 1 });
        assert_eq!(second.id, 2);

        let record = db.get_by_id(Collection::Categories, 2).await.unwrap().unwrap();
        assert_eq!(record["name"], "Kitchen");
        assert_eq!(record["id"], 2);
        assert!(record["created_at"].is_string());
        assert_eq!(record["created_at"], record["updated_at"]);
    }

    #[tokio::test]
    async fn test_id_is_max_plus_one_after_delete() {
        let db = test_db().await;
        for name in ["a", "b", "c"] {
            db.insert(Collection::Categories, fields(json!({ "name": name })))
                .await
                .unwrap();
        }
        db.delete(Collection::Categories, 2).await.unwrap();
        db.delete(Collection::Categories, 3).await.unwrap();

        let next = db
            .insert(Collection::Categories, fields(json!({ "name": "d" })))
            .await
            .unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_caller_cannot_set_reserved_fields() {
        let db = test_db().await;
        let inserted = db
            .insert(
                Collection::Products,
                fields(json!({ "id": 99, "created_at": "yesterday", "item_name": "Lamp" })),
            )
            .await
            .unwrap();
        assert_eq!(inserted.id, 1);

        let record = db.get_by_id(Collection::Products, 1).await.unwrap().unwrap();
        assert_eq!(record["id"], 1);
        assert_ne!(record["created_at"], "yesterday");
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let db = test_db().await;
        db.insert(
            Collection::Products,
            fields(json!({ "item_name": "Lamp", "total_stock": 5 })),
        )
        .await
        .unwrap();

        let changes = db
            .update(Collection::Products, 1, fields(json!({ "total_stock": 8 })))
            .await
            .unwrap();
        assert_eq!(changes, 1);

        let record = db.get_by_id(Collection::Products, 1).await.unwrap().unwrap();
        assert_eq!(record["item_name"], "Lamp");
        assert_eq!(record["total_stock"], 8);
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let db = test_db().await;
        let err = db
            .update(Collection::Orders, 7, fields(json!({ "notes": "x" })))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::RecordNotFound { id: 7, .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_noop() {
        let db = test_db().await;
        assert_eq!(db.delete(Collection::Orders, 7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_filters() {
        let db = test_db().await;
        for phone in ["555-0101", "555-0102", "555-0101"] {
            db.insert(Collection::Customers, fields(json!({ "phone": phone })))
                .await
                .unwrap();
        }
        let matches = db
            .query(Collection::Customers, &|r| r["phone"] == "555-0101")
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_drop() {
        let db = test_db().await;
        {
            let tx = db.begin().await.unwrap();
            tx.insert(Collection::Orders, fields(json!({ "order_number": "ORD-1" })))
                .await
                .unwrap();
            assert_eq!(tx.get_all(Collection::Orders).await.unwrap().len(), 1);
        }
        assert!(db.get_all(Collection::Orders).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transaction_commit_is_visible() {
        let db = test_db().await;
        let tx = db.begin().await.unwrap();
        tx.insert(Collection::Orders, fields(json!({ "order_number": "ORD-1" })))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let all = db.get_all(Collection::Orders).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["order_number"], "ORD-1");
    }

    #[tokio::test]
    async fn test_clear_all() {
        let db = test_db().await;
        db.insert(Collection::Products, fields(json!({ "item_name": "Lamp" })))
            .await
            .unwrap();
        db.insert(Collection::Customers, fields(json!({ "phone": "1" })))
            .await
            .unwrap();

        let tx = db.begin().await.unwrap();
        assert_eq!(tx.clear_all().await.unwrap(), 2);
        tx.commit().await.unwrap();

        for collection in Collection::ALL {
            assert!(db.get_all(collection).await.unwrap().is_empty());
        }
    }

    #[test]
    fn test_to_record_rejects_non_objects() {
        assert!(to_record(Collection::Products, &5).is_err());
        let record = to_record(Collection::Products, &json!({ "a": 1 })).unwrap();
        assert_eq!(record["a"], 1);
    }
}
