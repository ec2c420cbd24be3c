//! # Pre-order Repository
//!
//! Pre-orders mirror orders but never touch stock. They leave the
//! `pending` state once, through [`PreorderRepository::mark_converted`].

use serde::Serialize;
use tracing::debug;

use potu_core::{LineItem, NewPreorderItem, Preorder, PreorderFields, PreorderItem, PreorderStatus};

use super::{insert_and_load, load_all, load_one, load_where, refers_to, update_and_load};
use crate::error::DbResult;
use crate::store::{to_record, Collection, RecordAccess};

const PREORDERS: Collection = Collection::Preorders;
const ITEMS: Collection = Collection::PreorderItems;

#[derive(Serialize)]
struct Conversion {
    status: PreorderStatus,
    converted_order_id: i64,
}

pub struct PreorderRepository<'a> {
    store: &'a dyn RecordAccess,
}

impl<'a> PreorderRepository<'a> {
    pub fn new(store: &'a dyn RecordAccess) -> Self {
        PreorderRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Preorder>> {
        load_all(self.store, PREORDERS).await
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Preorder>> {
        debug!(id = id, "Getting pre-order by ID");
        load_one(self.store, PREORDERS, id).await
    }

    pub async fn insert(&self, fields: &PreorderFields) -> DbResult<Preorder> {
        debug!(preorder_number = %fields.preorder_number, "Inserting pre-order");
        insert_and_load(self.store, PREORDERS, fields).await
    }

    /// Records that pre-order `id` became order `order_id`.
    pub async fn mark_converted(&self, id: i64, order_id: i64) -> DbResult<Preorder> {
        debug!(id = id, order_id = order_id, "Marking pre-order converted");
        let conversion = Conversion {
            status: PreorderStatus::Converted,
            converted_order_id: order_id,
        };
        update_and_load(self.store, PREORDERS, id, &conversion).await
    }

    pub async fn delete(&self, id: i64) -> DbResult<u64> {
        debug!(id = id, "Deleting pre-order");
        self.store.delete(PREORDERS, id).await
    }

    // =========================================================================
    // Line Items
    // =========================================================================

    pub async fn all_items(&self) -> DbResult<Vec<PreorderItem>> {
        load_all(self.store, ITEMS).await
    }

    pub async fn items_for(&self, preorder_id: i64) -> DbResult<Vec<PreorderItem>> {
        load_where(self.store, ITEMS, &|r| refers_to(r, "preorder_id", preorder_id)).await
    }

    pub async fn insert_item(&self, preorder_id: i64, line: &LineItem) -> DbResult<i64> {
        let fields = to_record(ITEMS, &NewPreorderItem { preorder_id, line })?;
        Ok(self.store.insert(ITEMS, fields).await?.id)
    }

    pub async fn delete_items_for(&self, preorder_id: i64) -> DbResult<u64> {
        let items = self.items_for(preorder_id).await?;
        let mut removed = 0;
        for item in items {
            removed += self.store.delete(ITEMS, item.id).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use potu_core::Money;

    #[tokio::test]
    async fn test_mark_converted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fields = PreorderFields {
            preorder_number: "PRE-1".into(),
            customer_id: Some(1),
            customer_name: Some("Alice".into()),
            order_date: Utc::now(),
            total_amount: Money::from_cents(8999),
            status: PreorderStatus::Pending,
            notes: Some("Gift wrap".into()),
            converted_order_id: None,
        };
        let created = db.preorders().insert(&fields).await.unwrap();
        assert!(!created.is_converted());

        let converted = db.preorders().mark_converted(created.id, 4).await.unwrap();
        assert!(converted.is_converted());
        assert_eq!(converted.converted_order_id, Some(4));
        assert_eq!(converted.notes.as_deref(), Some("Gift wrap"));
    }
}
