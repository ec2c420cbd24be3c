//! # Order Repository
//!
//! Orders and their line items.
//!
//! ## Ownership
//! ```text
//! ┌──────────────────┐  1      N  ┌────────────────────┐
//! │     orders       │────────────│    order_items     │
//! │  id              │            │  order_id          │
//! │  order_number    │            │  product_id (weak) │
//! │  total_amount    │            │  product_name      │
//! └──────────────────┘            │  quantity, prices  │
//!                                 └────────────────────┘
//! ```
//! There are no foreign keys between collections; removing an order's
//! items before the order is the caller's job (`delete_items_for`).

use tracing::debug;

use potu_core::{LineItem, NewOrderItem, Order, OrderFields, OrderItem, OrderPatch};

use super::{insert_and_load, load_all, load_one, load_where, refers_to, update_and_load};
use crate::error::DbResult;
use crate::store::{to_record, Collection, RecordAccess};

const ORDERS: Collection = Collection::Orders;
const ITEMS: Collection = Collection::OrderItems;

pub struct OrderRepository<'a> {
    store: &'a dyn RecordAccess,
}

impl<'a> OrderRepository<'a> {
    pub fn new(store: &'a dyn RecordAccess) -> Self {
        OrderRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Order>> {
        load_all(self.store, ORDERS).await
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        debug!(id = id, "Getting order by ID");
        load_one(self.store, ORDERS, id).await
    }

    pub async fn for_customer(&self, customer_id: i64) -> DbResult<Vec<Order>> {
        load_where(self.store, ORDERS, &|r| refers_to(r, "customer_id", customer_id)).await
    }

    pub async fn insert(&self, fields: &OrderFields) -> DbResult<Order> {
        debug!(order_number = %fields.order_number, "Inserting order");
        insert_and_load(self.store, ORDERS, fields).await
    }

    pub async fn update(&self, id: i64, patch: &OrderPatch) -> DbResult<Order> {
        debug!(id = id, "Updating order");
        update_and_load(self.store, ORDERS, id, patch).await
    }

    pub async fn delete(&self, id: i64) -> DbResult<u64> {
        debug!(id = id, "Deleting order");
        self.store.delete(ORDERS, id).await
    }

    // =========================================================================
    // Line Items
    // =========================================================================

    pub async fn all_items(&self) -> DbResult<Vec<OrderItem>> {
        load_all(self.store, ITEMS).await
    }

    pub async fn items_for(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        load_where(self.store, ITEMS, &|r| refers_to(r, "order_id", order_id)).await
    }

    pub async fn insert_item(&self, order_id: i64, line: &LineItem) -> DbResult<i64> {
        let fields = to_record(ITEMS, &NewOrderItem { order_id, line })?;
        Ok(self.store.insert(ITEMS, fields).await?.id)
    }

    /// Deletes every item of `order_id`. Returns the number removed.
    pub async fn delete_items_for(&self, order_id: i64) -> DbResult<u64> {
        let items = self.items_for(order_id).await?;
        let mut removed = 0;
        for item in items {
            removed += self.store.delete(ITEMS, item.id).await?;
        }
        debug!(order_id = order_id, removed = removed, "Deleted order items");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use potu_core::{Money, OrderStatus};

    fn order_fields(number: &str, customer_id: i64) -> OrderFields {
        OrderFields {
            order_number: number.into(),
            customer_id: Some(customer_id),
            customer_name: Some("Alice".into()),
            order_date: Utc::now(),
            total_amount: Money::from_cents(17998),
            status: OrderStatus::Completed,
            notes: None,
            payment_method: Some("CARD".into()),
        }
    }

    fn line(qty: i64) -> LineItem {
        LineItem {
            product_id: Some(1),
            product_name: "Premium Headphones".into(),
            quantity: qty,
            unit_price: Money::from_cents(8999),
            subtotal: Money::from_cents(8999 * qty),
        }
    }

    #[tokio::test]
    async fn test_items_belong_to_their_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = db.orders().insert(&order_fields("ORD-1", 1)).await.unwrap();
        let second = db.orders().insert(&order_fields("ORD-2", 2)).await.unwrap();

        db.orders().insert_item(first.id, &line(2)).await.unwrap();
        db.orders().insert_item(first.id, &line(1)).await.unwrap();
        db.orders().insert_item(second.id, &line(5)).await.unwrap();

        let items = db.orders().items_for(first.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line.subtotal.cents(), 17998);

        assert_eq!(db.orders().delete_items_for(first.id).await.unwrap(), 2);
        assert!(db.orders().items_for(first.id).await.unwrap().is_empty());
        assert_eq!(db.orders().all_items().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_status_and_for_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.orders().insert(&order_fields("ORD-1", 1)).await.unwrap();
        db.orders().insert(&order_fields("ORD-2", 2)).await.unwrap();

        let patch = OrderPatch {
            status: Some(OrderStatus::Cancelled),
            notes: None,
        };
        let updated = db.orders().update(1, &patch).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Cancelled);
        assert_eq!(updated.order_number, "ORD-1");

        let theirs = db.orders().for_customer(2).await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].order_number, "ORD-2");
    }
}
