//! # Order Engine
//!
//! Orders, pre-orders and the stock accounting that goes with them.
//!
//! ## Write Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_order(request)                                                  │
//! │                                                                         │
//! │  1. validate (phone, items, quantities)       nothing written on error  │
//! │  2. BEGIN ─────────────────────────────────────────────────────────┐    │
//! │  │  find_or_create customer by phone                               │    │
//! │  │  insert order  ORD-<millis>, total = Σ subtotals                │    │
//! │  │  per item: insert order item, sold_items += quantity            │    │
//! │  └─ COMMIT ────────────────────────────────────────────────────────┘    │
//! │  3. email invoice if the request carried an address                     │
//! │     (failure logged, result unchanged)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pre-orders follow the same shape with `PRE-<millis>` and no stock
//! change. Converting one copies its items into a new order and moves
//! stock at that point.
//!
//! Line items hold a weak product reference. Stock adjustments against a
//! product that no longer exists are skipped.

use std::collections::HashMap;

use chrono::Utc;
use potu_core::numbering::{order_number, preorder_number};
use potu_core::validation::validate_order_request;
use potu_core::{order_total, ConvertRequest, CoreError, Customer, LineItem, Order, OrderDetails};
use potu_core::{OrderFields, OrderItem, OrderPatch, OrderRequest, OrderStatus, Preorder};
use potu_core::{PreorderDetails, PreorderFields, PreorderItem, PreorderStatus};
use potu_core::DEFAULT_PAYMENT_METHOD;
use potu_db::{Database, DbError, RecordAccess};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::customers::find_or_create;
use super::ServiceResult;
use crate::notification::Notifier;

// =============================================================================
// Results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: i64,
    pub customer_id: i64,
    /// True when the request carried an email address.
    pub email_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPreorder {
    pub preorder_id: i64,
    pub customer_id: i64,
    pub email_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedOrder {
    pub order_id: i64,
    pub order_number: String,
    /// True when the customer has an email address on file.
    pub email_sent: bool,
}

// =============================================================================
// Engine
// =============================================================================

pub struct OrderEngine<'a> {
    db: &'a Database,
    notifier: &'a dyn Notifier,
}

impl<'a> OrderEngine<'a> {
    pub fn new(db: &'a Database, notifier: &'a dyn Notifier) -> Self {
        OrderEngine { db, notifier }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Every order with its customer contact and items, newest first.
    pub async fn list_orders(&self) -> ServiceResult<Vec<OrderDetails>> {
        let orders = self.db.orders().list().await?;
        let customers = self.db.customers().list().await?;
        let items = self.db.orders().all_items().await?;

        let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        let mut details: Vec<OrderDetails> = orders
            .into_iter()
            .map(|order| {
                let customer = find_customer(&customers, order.customer_id);
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderDetails::new(order, customer, items)
            })
            .collect();
        details.sort_by(|a, b| {
            b.order
                .order_date
                .cmp(&a.order.order_date)
                .then(b.order.id.cmp(&a.order.id))
        });
        Ok(details)
    }

    pub async fn get_order(&self, id: i64) -> ServiceResult<OrderDetails> {
        let order = self
            .db
            .orders()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::OrderNotFound(id))?;
        let customer = match order.customer_id {
            Some(customer_id) => self.db.customers().get_by_id(customer_id).await?,
            None => None,
        };
        let items = self.db.orders().items_for(id).await?;
        Ok(OrderDetails::new(order, customer.as_ref(), items))
    }

    /// Records a sale and moves stock, all in one transaction.
    pub async fn create_order(&self, request: OrderRequest) -> ServiceResult<CreatedOrder> {
        validate_order_request(&request)?;

        let items: Vec<LineItem> = request.items.iter().cloned().map(LineItem::from).collect();
        let now = Utc::now();

        let tx = self.db.begin().await?;
        let customer = find_or_create(&tx, &request.contact()).await?;

        let order = tx
            .orders()
            .insert(&OrderFields {
                order_number: order_number(now),
                customer_id: Some(customer.id),
                customer_name: Some(customer.customer_name.clone()),
                order_date: now,
                total_amount: order_total(&items),
                status: OrderStatus::Completed,
                notes: request.notes.clone(),
                payment_method: request.payment_method.clone(),
            })
            .await?;

        for item in &items {
            tx.orders().insert_item(order.id, item).await?;
            sell(&tx, item).await?;
        }
        tx.commit().await?;

        info!(
            order_id = order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            items = items.len(),
            "Order created"
        );

        let recipient = request.recipient();
        if let Some(to) = recipient {
            self.send_invoice(order.id, to).await;
        }

        Ok(CreatedOrder {
            order_id: order.id,
            customer_id: customer.id,
            email_sent: recipient.is_some(),
        })
    }

    /// Changes status and/or notes.
    pub async fn update_order(&self, id: i64, patch: OrderPatch) -> ServiceResult<Order> {
        match self.db.orders().update(id, &patch).await {
            Ok(order) => {
                info!(id = id, status = ?order.status, "Order updated");
                Ok(order)
            }
            Err(DbError::RecordNotFound { .. }) => Err(CoreError::OrderNotFound(id).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes an order and gives its quantities back to stock.
    pub async fn delete_order(&self, id: i64) -> ServiceResult<()> {
        let tx = self.db.begin().await?;
        let order = tx
            .orders()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::OrderNotFound(id))?;

        let items = tx.orders().items_for(id).await?;
        for item in &items {
            let Some(product_id) = item.line.product_id else {
                continue;
            };
            if tx
                .products()
                .adjust_sold_items(product_id, -item.line.quantity)
                .await?
                .is_none()
            {
                warn!(
                    order_id = id,
                    product_id = product_id,
                    quantity = item.line.quantity,
                    "Product no longer exists, stock not restored"
                );
            }
        }

        tx.orders().delete_items_for(id).await?;
        tx.orders().delete(id).await?;
        tx.commit().await?;

        info!(id = id, order_number = %order.order_number, "Order deleted");
        Ok(())
    }

    // =========================================================================
    // Pre-orders
    // =========================================================================

    pub async fn list_preorders(&self) -> ServiceResult<Vec<PreorderDetails>> {
        let preorders = self.db.preorders().list().await?;
        let customers = self.db.customers().list().await?;
        let items = self.db.preorders().all_items().await?;

        let mut by_preorder: HashMap<i64, Vec<PreorderItem>> = HashMap::new();
        for item in items {
            by_preorder.entry(item.preorder_id).or_default().push(item);
        }

        let mut details: Vec<PreorderDetails> = preorders
            .into_iter()
            .map(|preorder| {
                let customer = find_customer(&customers, preorder.customer_id);
                let items = by_preorder.remove(&preorder.id).unwrap_or_default();
                PreorderDetails::new(preorder, customer, items)
            })
            .collect();
        details.sort_by(|a, b| {
            b.preorder
                .order_date
                .cmp(&a.preorder.order_date)
                .then(b.preorder.id.cmp(&a.preorder.id))
        });
        Ok(details)
    }

    pub async fn get_preorder(&self, id: i64) -> ServiceResult<PreorderDetails> {
        let preorder = self
            .db
            .preorders()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::PreorderNotFound(id))?;
        let customer = match preorder.customer_id {
            Some(customer_id) => self.db.customers().get_by_id(customer_id).await?,
            None => None,
        };
        let items = self.db.preorders().items_for(id).await?;
        Ok(PreorderDetails::new(preorder, customer.as_ref(), items))
    }

    /// Reserves items for a customer. Stock is untouched until conversion.
    pub async fn create_preorder(&self, request: OrderRequest) -> ServiceResult<CreatedPreorder> {
        validate_order_request(&request)?;

        let items: Vec<LineItem> = request.items.iter().cloned().map(LineItem::from).collect();
        let now = Utc::now();

        let tx = self.db.begin().await?;
        let customer = find_or_create(&tx, &request.contact()).await?;

        let preorder = tx
            .preorders()
            .insert(&PreorderFields {
                preorder_number: preorder_number(now),
                customer_id: Some(customer.id),
                customer_name: Some(customer.customer_name.clone()),
                order_date: now,
                total_amount: order_total(&items),
                status: PreorderStatus::Pending,
                notes: request.notes.clone(),
                converted_order_id: None,
            })
            .await?;

        for item in &items {
            tx.preorders().insert_item(preorder.id, item).await?;
        }
        tx.commit().await?;

        info!(
            preorder_id = preorder.id,
            preorder_number = %preorder.preorder_number,
            total = %preorder.total_amount,
            "Pre-order created"
        );

        let recipient = request.recipient();
        if let Some(to) = recipient {
            self.send_preorder_confirmation(preorder.id, to).await;
        }

        Ok(CreatedPreorder {
            preorder_id: preorder.id,
            customer_id: customer.id,
            email_sent: recipient.is_some(),
        })
    }

    /// Turns a pending pre-order into a completed order.
    ///
    /// ```text
    /// PRE-1718000000123 (pending)          ORD-1718000500456 (completed)
    ///   items ──────────── copied ───────►   items, sold_items += qty
    ///   status ← converted
    ///   converted_order_id ───────────────►  id
    /// ```
    pub async fn convert_preorder(&self, id: i64, request: ConvertRequest) -> ServiceResult<ConvertedOrder> {
        let tx = self.db.begin().await?;
        let preorder = tx
            .preorders()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::PreorderNotFound(id))?;

        if preorder.is_converted() {
            return Err(CoreError::AlreadyConverted {
                preorder_number: preorder.preorder_number,
            }
            .into());
        }

        let payment_method = request
            .payment_method
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

        let order = tx
            .orders()
            .insert(&OrderFields {
                order_number: order_number(Utc::now()),
                customer_id: preorder.customer_id,
                customer_name: preorder.customer_name.clone(),
                order_date: Utc::now(),
                total_amount: preorder.total_amount,
                status: OrderStatus::Completed,
                notes: Some(preorder.conversion_note()),
                payment_method: Some(payment_method),
            })
            .await?;

        let items = tx.preorders().items_for(id).await?;
        for item in &items {
            tx.orders().insert_item(order.id, &item.line).await?;
            sell(&tx, &item.line).await?;
        }

        tx.preorders().mark_converted(id, order.id).await?;

        let customer = match preorder.customer_id {
            Some(customer_id) => tx.customers().get_by_id(customer_id).await?,
            None => None,
        };
        tx.commit().await?;

        info!(
            preorder_number = %preorder.preorder_number,
            order_number = %order.order_number,
            "Pre-order converted to order"
        );

        let recipient = customer.as_ref().and_then(Customer::contact_email);
        if let Some(to) = recipient {
            self.send_invoice(order.id, to).await;
        }

        Ok(ConvertedOrder {
            order_id: order.id,
            order_number: order.order_number,
            email_sent: recipient.is_some(),
        })
    }

    /// Deletes a pre-order and its items. Stock is untouched.
    pub async fn delete_preorder(&self, id: i64) -> ServiceResult<()> {
        let tx = self.db.begin().await?;
        let preorder = tx
            .preorders()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::PreorderNotFound(id))?;
        tx.preorders().delete_items_for(id).await?;
        tx.preorders().delete(id).await?;
        tx.commit().await?;

        info!(id = id, preorder_number = %preorder.preorder_number, "Pre-order deleted");
        Ok(())
    }

    /// The order a pre-order was converted into, ready for invoicing.
    pub async fn preorder_invoice(&self, id: i64) -> ServiceResult<OrderDetails> {
        let preorder: Preorder = self
            .db
            .preorders()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::PreorderNotFound(id))?;

        let order_id = preorder
            .converted_order_id
            .ok_or(CoreError::PreorderNotConverted(id))?;

        match self.get_order(order_id).await {
            Err(super::ServiceError::Domain(CoreError::OrderNotFound(_))) => {
                Err(CoreError::PreorderNotConverted(id).into())
            }
            other => other,
        }
    }

    // =========================================================================
    // Notification
    // =========================================================================

    async fn send_invoice(&self, order_id: i64, to: &str) {
        let details = match self.get_order(order_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(order_id = order_id, error = %e, "Could not load order for invoice email");
                return;
            }
        };
        match self.notifier.send_invoice(&details, to).await {
            Ok(()) => debug!(order_id = order_id, "Invoice email handed off"),
            Err(e) => warn!(order_id = order_id, error = %e, "Failed to send invoice email"),
        }
    }

    async fn send_preorder_confirmation(&self, preorder_id: i64, to: &str) {
        let details = match self.get_preorder(preorder_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(preorder_id = preorder_id, error = %e, "Could not load pre-order for confirmation");
                return;
            }
        };
        match self.notifier.send_preorder_confirmation(&details, to).await {
            Ok(()) => debug!(preorder_id = preorder_id, "Confirmation email handed off"),
            Err(e) => warn!(preorder_id = preorder_id, error = %e, "Failed to send pre-order confirmation"),
        }
    }
}

fn find_customer(customers: &[Customer], id: Option<i64>) -> Option<&Customer> {
    id.and_then(|id| customers.iter().find(|c| c.id == id))
}

/// Adds the line's quantity to its product. Lines without a product, or
/// whose product is gone, are skipped.
async fn sell<S: RecordAccess>(store: &S, line: &LineItem) -> Result<(), DbError> {
    let Some(product_id) = line.product_id else {
        return Ok(());
    };
    if store.products().adjust_sold_items(product_id, line.quantity).await?.is_none() {
        debug!(product_id = product_id, "Product not found, sold_items not adjusted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::DisabledNotifier;
    use crate::services::ServiceError;
    use potu_core::{LineItemInput, Money, ProductFields};
    use potu_db::DbConfig;

    async fn setup() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&ProductFields {
                serial_no: "PROD-001".into(),
                product_code: None,
                item_name: "Premium Headphones".into(),
                item_category: Some("Electronics".into()),
                unit: "pcs".into(),
                total_stock: 50,
                sold_items: 15,
                price: Money::from_cents(8999),
            })
            .await
            .unwrap();
        (db, product.id)
    }

    fn request(product_id: i64, quantity: i64) -> OrderRequest {
        OrderRequest {
            customer_name: Some("Alice".into()),
            customer_phone: Some("555-0101".into()),
            items: vec![LineItemInput {
                product_id: Some(product_id),
                product_name: Some("Premium Headphones".into()),
                quantity,
                unit_price: Money::from_cents(8999),
                subtotal: Some(Money::from_cents(8999 * quantity)),
            }],
            ..OrderRequest::default()
        }
    }

    async fn sold(db: &Database, id: i64) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().sold_items
    }

    #[tokio::test]
    async fn test_create_order_moves_stock() {
        let (db, product_id) = setup().await;
        let engine = OrderEngine::new(&db, &DisabledNotifier);

        let created = engine.create_order(request(product_id, 2)).await.unwrap();
        assert!(!created.email_sent);

        let product = db.products().get_by_id(product_id).await.unwrap().unwrap();
        assert_eq!(product.sold_items, 17);
        assert_eq!(product.remaining_items(), 33);

        let details = engine.get_order(created.order_id).await.unwrap();
        assert_eq!(details.order.total_amount, Money::from_cents(17998));
        assert!(details.order.order_number.starts_with("ORD-"));
        assert_eq!(details.order.status, OrderStatus::Completed);
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.contact.customer_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_invalid_order_writes_nothing() {
        let (db, product_id) = setup().await;
        let engine = OrderEngine::new(&db, &DisabledNotifier);

        let mut no_phone = request(product_id, 1);
        no_phone.customer_phone = Some("  ".into());
        let err = engine.create_order(no_phone).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::Validation(_))));

        let zero_quantity = request(product_id, 0);
        assert!(engine.create_order(zero_quantity).await.is_err());

        assert!(db.orders().list().await.unwrap().is_empty());
        assert!(db.customers().list().await.unwrap().is_empty());
        assert_eq!(sold(&db, product_id).await, 15);
    }

    #[tokio::test]
    async fn test_delete_order_restores_stock() {
        let (db, product_id) = setup().await;
        let engine = OrderEngine::new(&db, &DisabledNotifier);

        let created = engine.create_order(request(product_id, 3)).await.unwrap();
        assert_eq!(sold(&db, product_id).await, 18);

        engine.delete_order(created.order_id).await.unwrap();
        assert_eq!(sold(&db, product_id).await, 15);
        assert!(db.orders().all_items().await.unwrap().is_empty());

        let err = engine.delete_order(created.order_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_preorder_conversion() {
        let (db, product_id) = setup().await;
        let engine = OrderEngine::new(&db, &DisabledNotifier);

        let created = engine.create_preorder(request(product_id, 2)).await.unwrap();
        assert_eq!(sold(&db, product_id).await, 15);

        let converted = engine
            .convert_preorder(created.preorder_id, ConvertRequest::default())
            .await
            .unwrap();
        assert_eq!(sold(&db, product_id).await, 17);

        let preorder = db.preorders().get_by_id(created.preorder_id).await.unwrap().unwrap();
        assert_eq!(preorder.status, PreorderStatus::Converted);
        assert_eq!(preorder.converted_order_id, Some(converted.order_id));

        let order = engine.get_order(converted.order_id).await.unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].line.quantity, 2);
        assert_eq!(order.order.payment_method.as_deref(), Some("CASH"));
        assert!(order
            .order
            .notes
            .as_deref()
            .unwrap()
            .contains(&preorder.preorder_number));

        let again = engine
            .convert_preorder(created.preorder_id, ConvertRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(again, ServiceError::Domain(CoreError::AlreadyConverted { .. })));
        assert_eq!(sold(&db, product_id).await, 17);

        let invoice = engine.preorder_invoice(created.preorder_id).await.unwrap();
        assert_eq!(invoice.order.id, converted.order_id);
    }

    #[tokio::test]
    async fn test_invoice_for_pending_preorder_is_not_found() {
        let (db, product_id) = setup().await;
        let engine = OrderEngine::new(&db, &DisabledNotifier);

        let created = engine.create_preorder(request(product_id, 1)).await.unwrap();
        let err = engine.preorder_invoice(created.preorder_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::PreorderNotConverted(_))));
    }
}
