//! # Domain Types
//!
//! Records kept by the store and the request shapes that create them.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │    Category     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  serial_no      │   │  phone (dedup)  │   │  name (unique)  │       │
//! │  │  item_category ─┼───┼─────────────────┼──►│                 │       │
//! │  │  total_stock    │   │  email          │   └─────────────────┘       │
//! │  │  sold_items     │   └────────▲────────┘                             │
//! │  └────────▲────────┘            │ customer_id (weak)                   │
//! │           │ product_id (weak)   │                                       │
//! │  ┌────────┴────────┐   ┌────────┴────────┐   ┌─────────────────┐       │
//! │  │   OrderItem     │◄──│     Order       │◄──│    Preorder     │       │
//! │  │  snapshot of    │   │  ORD-<millis>   │   │  PRE-<millis>   │       │
//! │  │  name + price   │   │  total_amount   │   │  pending ──►    │       │
//! │  └─────────────────┘   └─────────────────┘   │  converted      │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Record Identity
//! Every record has a store-assigned integer `id` plus store-owned
//! `created_at`/`updated_at`. The `*Fields` structs carry everything else
//! and are what the repositories write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_UNIT;

/// Store-assigned record identifier.
pub type RecordId = i64;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps is the 10% VAT printed on invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_VAT_BPS)
    }
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: RecordId,

    /// Generated as `PROD-<millis>-<4 digits>` when the caller gives none.
    #[serde(default)]
    pub serial_no: String,

    #[serde(default)]
    pub product_code: Option<String>,

    pub item_name: String,

    /// Free-text reference to `Category::name`. Not enforced.
    #[serde(default)]
    pub item_category: Option<String>,

    #[serde(default = "default_unit")]
    pub unit: String,

    #[serde(default)]
    pub total_stock: i64,

    /// Quantity sold through orders. Moves only with order creation,
    /// pre-order conversion, order deletion and manual correction.
    #[serde(default)]
    pub sold_items: i64,

    #[serde(default)]
    #[ts(type = "number")]
    pub price: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Stock still on hand. Negative when more was sold than stocked.
    #[inline]
    pub fn remaining_items(&self) -> i64 {
        self.total_stock - self.sold_items
    }

    /// Value of all stock ever received, at the current price.
    pub fn total_value(&self) -> Money {
        self.price.multiply_quantity(self.total_stock)
    }

    /// Revenue implied by `sold_items` at the current price.
    pub fn revenue(&self) -> Money {
        self.price.multiply_quantity(self.sold_items)
    }
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    #[serde(default)]
    pub serial_no: Option<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub item_category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub total_stock: Option<i64>,
    #[serde(default)]
    #[ts(type = "number | null")]
    pub price: Option<Money>,
}

/// Product columns as written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub serial_no: String,
    pub product_code: Option<String>,
    pub item_name: String,
    pub item_category: Option<String>,
    pub unit: String,
    pub total_stock: i64,
    pub sold_items: i64,
    pub price: Money,
}

impl ProductFields {
    /// Applies creation defaults: unit `pcs`, zero stock, zero price,
    /// nothing sold. `serial_no` is used only when the request has none.
    pub fn from_new(new: NewProduct, generated_serial: String) -> Self {
        ProductFields {
            serial_no: new
                .serial_no
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(generated_serial),
            product_code: new.product_code,
            item_name: new.item_name,
            item_category: new.item_category,
            unit: new
                .unit
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(default_unit),
            total_stock: new.total_stock.unwrap_or(0),
            sold_items: 0,
            price: new.price.unwrap_or_default(),
        }
    }
}

/// Partial update of a product. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_items: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub price: Option<Money>,
}

/// A product together with its derived remaining stock.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ProductWithStock {
    #[serde(flatten)]
    pub product: Product,
    pub remaining_items: i64,
}

impl From<Product> for ProductWithStock {
    fn from(product: Product) -> Self {
        let remaining_items = product.remaining_items();
        ProductWithStock {
            product,
            remaining_items,
        }
    }
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/categories`, also the stored columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: RecordId,
    #[serde(default)]
    pub customer_name: String,
    /// Identity key for find-or-create. Compared verbatim, never normalized.
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Email address if one is on file and non-empty.
    pub fn contact_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// Customer columns, used for `POST /api/customers` and for find-or-create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerFields {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update of a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

impl CustomerFields {
    /// Coalesce update for an existing customer with the same phone:
    /// a non-empty input wins, an empty or missing input keeps what is stored.
    ///
    /// ```rust
    /// use potu_core::types::CustomerFields;
    ///
    /// let input = CustomerFields {
    ///     customer_name: String::new(),
    ///     phone: "555-0101".into(),
    ///     email: Some("new@example.com".into()),
    ///     address: None,
    /// };
    /// let patch = input.coalesce_patch();
    /// assert_eq!(patch.customer_name, None);
    /// assert_eq!(patch.email.as_deref(), Some("new@example.com"));
    /// ```
    pub fn coalesce_patch(&self) -> CustomerPatch {
        CustomerPatch {
            customer_name: Some(self.customer_name.clone()).filter(|n| !n.is_empty()),
            phone: None,
            email: non_empty(&self.email),
            address: non_empty(&self.address),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of an order. The engine only ever writes `Completed`;
/// the others are set by hand through `PUT /api/orders/:id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    #[default]
    Completed,
    Cancelled,
}

/// Pre-orders move `Pending → Converted` once, through conversion only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PreorderStatus {
    #[default]
    Pending,
    Converted,
}

// =============================================================================
// Line Items
// =============================================================================

/// The snapshot a line item keeps of what was sold.
/// Product name and unit price are frozen at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Weak reference; the product may be deleted later.
    #[serde(default)]
    pub product_id: Option<RecordId>,
    #[serde(default)]
    pub product_name: String,
    pub quantity: i64,
    #[ts(type = "number")]
    pub unit_price: Money,
    #[ts(type = "number")]
    pub subtotal: Money,
}

/// A line item as the client sends it.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct LineItemInput {
    #[serde(default)]
    pub product_id: Option<RecordId>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    #[ts(type = "number")]
    pub unit_price: Money,
    /// Trusted as given. Computed from quantity × unit price only when absent.
    #[serde(default)]
    #[ts(type = "number | null")]
    pub subtotal: Option<Money>,
}

impl From<LineItemInput> for LineItem {
    fn from(input: LineItemInput) -> Self {
        let subtotal = input
            .subtotal
            .unwrap_or_else(|| input.unit_price.multiply_quantity(input.quantity));
        LineItem {
            product_id: input.product_id,
            product_name: input.product_name.unwrap_or_default(),
            quantity: input.quantity,
            unit_price: input.unit_price,
            subtotal,
        }
    }
}

/// Σ subtotal over the lines. No tax.
pub fn order_total(items: &[LineItem]) -> Money {
    items.iter().map(|i| i.subtotal).sum()
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: RecordId,
    pub order_number: String,
    #[serde(default)]
    pub customer_id: Option<RecordId>,
    /// Copy of the customer name as given at order time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    #[ts(type = "number")]
    pub total_amount: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
    /// How the customer paid, as printed on the invoice.
    #[serde(default)]
    pub payment_method: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Payment method for the invoice, `CASH` when none was recorded.
    pub fn payment_method_or_default(&self) -> &str {
        self.payment_method
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(crate::DEFAULT_PAYMENT_METHOD)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFields {
    pub order_number: String,
    pub customer_id: Option<RecordId>,
    pub customer_name: Option<String>,
    pub order_date: DateTime<Utc>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
}

/// Body of `PUT /api/orders/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub id: RecordId,
    pub order_id: RecordId,
    #[serde(flatten)]
    pub line: LineItem,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem<'a> {
    pub order_id: RecordId,
    #[serde(flatten)]
    pub line: &'a LineItem,
}

// =============================================================================
// Preorder
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Preorder {
    pub id: RecordId,
    pub preorder_number: String,
    #[serde(default)]
    pub customer_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    #[ts(type = "number")]
    pub total_amount: Money,
    #[serde(default)]
    pub status: PreorderStatus,
    #[serde(default)]
    pub notes: Option<String>,
    /// Set exactly once, by conversion.
    #[serde(default)]
    pub converted_order_id: Option<RecordId>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Preorder {
    /// Notes for the order a conversion creates, pointing back at this
    /// pre-order: `[From Pre-order PRE-1] notes` or `From Pre-order PRE-1`.
    pub fn conversion_note(&self) -> String {
        match self.notes.as_deref().filter(|n| !n.is_empty()) {
            Some(notes) => format!("[From Pre-order {}] {}", self.preorder_number, notes),
            None => format!("From Pre-order {}", self.preorder_number),
        }
    }

    pub fn is_converted(&self) -> bool {
        self.status == PreorderStatus::Converted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreorderFields {
    pub preorder_number: String,
    pub customer_id: Option<RecordId>,
    pub customer_name: Option<String>,
    pub order_date: DateTime<Utc>,
    pub total_amount: Money,
    pub status: PreorderStatus,
    pub notes: Option<String>,
    pub converted_order_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PreorderItem {
    pub id: RecordId,
    pub preorder_id: RecordId,
    #[serde(flatten)]
    pub line: LineItem,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPreorderItem<'a> {
    pub preorder_id: RecordId,
    #[serde(flatten)]
    pub line: &'a LineItem,
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /api/orders` and `POST /api/preorders`.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct OrderRequest {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl OrderRequest {
    /// Contact details in the shape find-or-create expects.
    pub fn contact(&self) -> CustomerFields {
        CustomerFields {
            customer_name: self.customer_name.clone().unwrap_or_default(),
            phone: self.customer_phone.clone().unwrap_or_default(),
            email: self.customer_email.clone(),
            address: self.customer_address.clone(),
        }
    }

    /// Recipient for the notification, if the request carries one.
    pub fn recipient(&self) -> Option<&str> {
        self.customer_email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
    }
}

/// Body of `POST /api/preorders/:id/kick-to-sell`.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct ConvertRequest {
    #[serde(default)]
    pub payment_method: Option<String>,
}

// =============================================================================
// Detail Views
// =============================================================================

/// Customer contact resolved from the customer record at read time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct CustomerContact {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
}

impl CustomerContact {
    /// Resolves contact details, falling back to the name copied onto the
    /// order when the customer record is gone.
    pub fn resolve(customer: Option<&Customer>, fallback_name: Option<&str>) -> Self {
        match customer {
            Some(c) => CustomerContact {
                customer_name: Some(c.customer_name.clone()),
                customer_phone: Some(c.phone.clone()),
                customer_email: c.email.clone(),
                customer_address: c.address.clone(),
            },
            None => CustomerContact {
                customer_name: fallback_name.map(str::to_string),
                ..CustomerContact::default()
            },
        }
    }
}

/// An order with its customer and items, as listed by the API and as
/// handed to invoice rendering.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    #[serde(flatten)]
    pub contact: CustomerContact,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PreorderDetails {
    #[serde(flatten)]
    pub preorder: Preorder,
    #[serde(flatten)]
    pub contact: CustomerContact,
    pub items: Vec<PreorderItem>,
}

impl OrderDetails {
    /// Joins an order with its customer and items. The contact replaces
    /// the name copied onto the order so it appears once on the wire.
    pub fn new(mut order: Order, customer: Option<&Customer>, items: Vec<OrderItem>) -> Self {
        let contact = CustomerContact::resolve(customer, order.customer_name.as_deref());
        order.customer_name = None;
        OrderDetails {
            order,
            contact,
            items,
        }
    }
}

impl PreorderDetails {
    pub fn new(mut preorder: Preorder, customer: Option<&Customer>, items: Vec<PreorderItem>) -> Self {
        let contact = CustomerContact::resolve(customer, preorder.customer_name.as_deref());
        preorder.customer_name = None;
        PreorderDetails {
            preorder,
            contact,
            items,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(total: i64, sold: i64, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            serial_no: "SKU-001".into(),
            product_code: None,
            item_name: "Premium Headphones".into(),
            item_category: Some("Electronics".into()),
            unit: "pcs".into(),
            total_stock: total,
            sold_items: sold,
            price: Money::from_cents(price_cents),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1000);
        assert_eq!(rate.bps(), 1000);
        assert!((rate.percentage() - 10.0).abs() < 0.001);
        assert_eq!(TaxRate::default(), rate);
    }

    #[test]
    fn test_remaining_items_may_go_negative() {
        assert_eq!(product(50, 17, 8999).remaining_items(), 33);
        assert_eq!(product(5, 8, 100).remaining_items(), -3);
    }

    #[test]
    fn test_inventory_values() {
        let p = product(50, 15, 8999);
        assert_eq!(p.total_value().cents(), 449950);
        assert_eq!(p.revenue().cents(), 134985);
    }

    #[test]
    fn test_product_defaults_on_create() {
        let new = NewProduct {
            item_name: "Desk Lamp".into(),
            ..NewProduct::default()
        };
        let fields = ProductFields::from_new(new, "PROD-1-1234".into());
        assert_eq!(fields.serial_no, "PROD-1-1234");
        assert_eq!(fields.unit, "pcs");
        assert_eq!(fields.total_stock, 0);
        assert_eq!(fields.sold_items, 0);
        assert!(fields.price.is_zero());
    }

    #[test]
    fn test_product_keeps_given_serial() {
        let new = NewProduct {
            serial_no: Some("SKU-009".into()),
            item_name: "Mouse".into(),
            unit: Some("box".into()),
            ..NewProduct::default()
        };
        let fields = ProductFields::from_new(new, "PROD-1-1234".into());
        assert_eq!(fields.serial_no, "SKU-009");
        assert_eq!(fields.unit, "box");
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = ProductPatch {
            total_stock: Some(60),
            ..ProductPatch::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "total_stock": 60 }));
    }

    #[test]
    fn test_line_item_subtotal_is_trusted() {
        let input = LineItemInput {
            product_id: Some(1),
            product_name: Some("Premium Headphones".into()),
            quantity: 2,
            unit_price: Money::from_cents(8999),
            subtotal: Some(Money::from_cents(15000)),
        };
        assert_eq!(LineItem::from(input).subtotal.cents(), 15000);
    }

    #[test]
    fn test_line_item_subtotal_computed_when_missing() {
        let input = LineItemInput {
            quantity: 2,
            unit_price: Money::from_cents(8999),
            ..LineItemInput::default()
        };
        let line = LineItem::from(input);
        assert_eq!(line.subtotal.cents(), 17998);
        assert_eq!(order_total(&[line.clone(), line]).cents(), 35996);
    }

    #[test]
    fn test_conversion_note() {
        let now = Utc::now();
        let mut pre = Preorder {
            id: 1,
            preorder_number: "PRE-1700000000000".into(),
            customer_id: Some(1),
            customer_name: None,
            order_date: now,
            total_amount: Money::zero(),
            status: PreorderStatus::Pending,
            notes: None,
            converted_order_id: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(pre.conversion_note(), "From Pre-order PRE-1700000000000");

        pre.notes = Some("Gift wrap".into());
        assert_eq!(
            pre.conversion_note(),
            "[From Pre-order PRE-1700000000000] Gift wrap"
        );
    }

    #[test]
    fn test_status_defaults_and_wire_format() {
        assert_eq!(OrderStatus::default(), OrderStatus::Completed);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(PreorderStatus::default(), PreorderStatus::Pending);
    }

    #[test]
    fn test_order_details_name_appears_once() {
        let now = Utc::now();
        let order = Order {
            id: 1,
            order_number: "ORD-1".into(),
            customer_id: Some(9),
            customer_name: Some("Walk-in".into()),
            order_date: now,
            total_amount: Money::from_cents(100),
            status: OrderStatus::Completed,
            notes: None,
            payment_method: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(order.payment_method_or_default(), "CASH");
        let details = OrderDetails::new(order, None, Vec::new());
        let text = serde_json::to_string(&details).unwrap();
        assert_eq!(text.matches("\"customer_name\"").count(), 1);
        assert_eq!(details.contact.customer_name.as_deref(), Some("Walk-in"));
        assert_eq!(details.contact.customer_phone, None);
    }

    #[test]
    fn test_order_item_is_flat_on_the_wire() {
        let now = Utc::now();
        let item = OrderItem {
            id: 3,
            order_id: 7,
            line: LineItem {
                product_id: Some(1),
                product_name: "Premium Headphones".into(),
                quantity: 2,
                unit_price: Money::from_cents(8999),
                subtotal: Money::from_cents(17998),
            },
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["order_id"], 7);
        assert_eq!(value["quantity"], 2);
        assert_eq!(value["subtotal"], 179.98);
    }
}
