//! # Product Repository
//!
//! Catalog records and the `sold_items` counter.
//!
//! ## Stock Accounting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  remaining_items = total_stock − sold_items                             │
//! │                                                                         │
//! │  create order (qty 2)       adjust_sold_items(id, +2)   15 → 17         │
//! │  convert pre-order (qty 2)  adjust_sold_items(id, +2)                   │
//! │  delete order (qty 2)       adjust_sold_items(id, −2)   17 → 15         │
//! │  create/delete pre-order    (no change)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::json;
use tracing::debug;

use potu_core::{Product, ProductFields, ProductPatch};

use super::{insert_and_load, load_all, load_one, load_where, update_and_load};
use crate::error::{DbError, DbResult};
use crate::store::{to_record, Collection, RecordAccess};

const COLLECTION: Collection = Collection::Products;

/// Repository for products.
///
/// ## Usage
/// ```rust,ignore
/// let product = db.products().get_by_id(1).await?;
/// let updated = tx.products().adjust_sold_items(1, 2).await?;
/// ```
pub struct ProductRepository<'a> {
    store: &'a dyn RecordAccess,
}

impl<'a> ProductRepository<'a> {
    pub fn new(store: &'a dyn RecordAccess) -> Self {
        ProductRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Product>> {
        load_all(self.store, COLLECTION).await
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        debug!(id = id, "Getting product by ID");
        load_one(self.store, COLLECTION, id).await
    }

    pub async fn insert(&self, fields: &ProductFields) -> DbResult<Product> {
        debug!(serial_no = %fields.serial_no, name = %fields.item_name, "Inserting product");
        insert_and_load(self.store, COLLECTION, fields).await
    }

    /// Applies the fields present in `patch`.
    /// Fails with `RecordNotFound` when the product doesn't exist.
    pub async fn update(&self, id: i64, patch: &ProductPatch) -> DbResult<Product> {
        debug!(id = id, "Updating product");
        update_and_load(self.store, COLLECTION, id, patch).await
    }

    pub async fn delete(&self, id: i64) -> DbResult<u64> {
        debug!(id = id, "Deleting product");
        self.store.delete(COLLECTION, id).await
    }

    /// Adds `delta` to `sold_items` (negative to give stock back).
    ///
    /// Returns `None` without writing when the product no longer exists;
    /// line items keep only a weak reference to their product.
    pub async fn adjust_sold_items(&self, id: i64, delta: i64) -> DbResult<Option<Product>> {
        let Some(product) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let sold_items = product.sold_items.checked_add(delta).ok_or_else(|| {
            DbError::Internal(format!(
                "sold_items out of range for product {}: {} + {}",
                id, product.sold_items, delta
            ))
        })?;
        debug!(id = id, delta = delta, sold_items = sold_items, "Adjusting sold items");

        let fields = to_record(COLLECTION, &json!({ "sold_items": sold_items }))?;
        self.store.update(COLLECTION, id, fields).await?;
        self.get_by_id(id).await
    }

    /// Number of products whose `item_category` equals `name`.
    pub async fn count_in_category(&self, name: &str) -> DbResult<usize> {
        let matching: Vec<Product> = load_where(self.store, COLLECTION, &|r| {
            r.get("item_category").and_then(|v| v.as_str()) == Some(name)
        })
        .await?;
        Ok(matching.len())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use potu_core::Money;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn headphones() -> ProductFields {
        ProductFields {
            serial_no: "SKU-001".into(),
            product_code: Some("HP-01".into()),
            item_name: "Premium Headphones".into(),
            item_category: Some("Electronics".into()),
            unit: "pcs".into(),
            total_stock: 50,
            sold_items: 15,
            price: Money::from_cents(8999),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup().await;
        let created = db.products().insert(&headphones()).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.price.cents(), 8999);
        assert_eq!(created.remaining_items(), 35);

        let found = db.products().get_by_id(1).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert!(db.products().get_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = setup().await;
        db.products().insert(&headphones()).await.unwrap();

        let patch = ProductPatch {
            price: Some(Money::from_cents(7999)),
            ..ProductPatch::default()
        };
        let updated = db.products().update(1, &patch).await.unwrap();
        assert_eq!(updated.price.cents(), 7999);
        assert_eq!(updated.item_name, "Premium Headphones");
        assert_eq!(updated.total_stock, 50);
    }

    #[tokio::test]
    async fn test_adjust_sold_items() {
        let db = setup().await;
        db.products().insert(&headphones()).await.unwrap();

        let after = db.products().adjust_sold_items(1, 2).await.unwrap().unwrap();
        assert_eq!(after.sold_items, 17);
        assert_eq!(after.remaining_items(), 33);

        let back = db.products().adjust_sold_items(1, -2).await.unwrap().unwrap();
        assert_eq!(back.sold_items, 15);
    }

    #[tokio::test]
    async fn test_adjust_out_of_range_is_an_error() {
        let db = setup().await;
        let mut maxed = headphones();
        maxed.sold_items = i64::MAX;
        db.products().insert(&maxed).await.unwrap();

        let err = db.products().adjust_sold_items(1, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Internal(_)));
        assert_eq!(db.products().get_by_id(1).await.unwrap().unwrap().sold_items, i64::MAX);
    }

    #[tokio::test]
    async fn test_adjust_missing_product_is_skipped() {
        let db = setup().await;
        assert!(db.products().adjust_sold_items(9, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_in_category() {
        let db = setup().await;
        db.products().insert(&headphones()).await.unwrap();
        db.products().insert(&headphones()).await.unwrap();
        let mut lamp = headphones();
        lamp.item_category = Some("Home".into());
        db.products().insert(&lamp).await.unwrap();

        assert_eq!(db.products().count_in_category("Electronics").await.unwrap(), 2);
        assert_eq!(db.products().count_in_category("Toys").await.unwrap(), 0);
    }
}
