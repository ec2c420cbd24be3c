//! # Report Aggregation
//!
//! Read-only views computed from records already loaded from the store.
//! Every function here is pure: hand it slices, get a view back.
//!
//! ## Report Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReportService (server)                                                 │
//! │       │  get_all(products), get_all(orders), ...                        │
//! │       ▼                                                                 │
//! │  reports::dashboard(&products, &orders, &customers, &items)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DashboardStats  ──►  JSON (camelCase keys)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::{Customer, CustomerContact, Order, OrderItem, Product, ProductWithStock, RecordId};
use crate::{DASHBOARD_LIST_SIZE, DASHBOARD_LOW_STOCK_LEVEL};

/// Label used for order items whose product has no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: usize,
    pub low_stock_count: usize,
    pub total_orders: usize,
    pub total_customers: usize,
    pub recent_orders: Vec<Order>,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct TopProduct {
    pub item_name: String,
    pub item_category: Option<String>,
    /// Quantity summed over order items, not the product counter.
    pub sold_items: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct InventoryLine {
    #[serde(flatten)]
    pub product: Product,
    pub remaining_items: i64,
    #[ts(type = "number")]
    pub total_value: Money,
    #[ts(type = "number")]
    pub revenue: Money,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct SalesReport {
    pub orders: Vec<Order>,
    pub summary: SalesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_orders: usize,
    #[ts(type = "number")]
    pub total_sales: Money,
    #[ts(type = "number")]
    pub average_order_value: Money,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct CustomerSpend {
    #[serde(flatten)]
    pub customer: Customer,
    pub total_orders: usize,
    #[ts(type = "number")]
    pub total_spent: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct CategorySales {
    pub category: String,
    pub quantity: i64,
    #[ts(type = "number")]
    pub revenue: Money,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct CustomerWithOrderCount {
    #[serde(flatten)]
    pub customer: Customer,
    pub order_count: usize,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct CustomerWithProducts {
    #[serde(flatten)]
    pub customer: Customer,
    pub purchased_products: Vec<String>,
}

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive creation-date window for the sales report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Builds a range from query parameters.
    ///
    /// Both bounds must be present to filter at all; with either missing the
    /// report covers every order. Accepts RFC 3339 timestamps or plain
    /// `YYYY-MM-DD` dates. A plain end date covers that whole day.
    ///
    /// ```rust
    /// use potu_core::reports::DateRange;
    ///
    /// let range = DateRange::parse(Some("2024-03-01"), Some("2024-03-01")).unwrap().unwrap();
    /// assert!(range.end > range.start);
    /// assert!(DateRange::parse(Some("2024-03-01"), None).unwrap().is_none());
    /// ```
    pub fn parse(start: Option<&str>, end: Option<&str>) -> ValidationResult<Option<Self>> {
        let (Some(start), Some(end)) = (
            start.filter(|s| !s.trim().is_empty()),
            end.filter(|s| !s.trim().is_empty()),
        ) else {
            return Ok(None);
        };

        Ok(Some(DateRange {
            start: parse_bound("startDate", start, false)?,
            end: parse_bound("endDate", end, true)?,
        }))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

fn parse_bound(field: &str, raw: &str, end_of_day: bool) -> ValidationResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("'{}' is not a date", raw),
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let start_of_day = date.and_time(NaiveTime::MIN).and_utc();
    if !end_of_day {
        return Ok(start_of_day);
    }

    let next_day = start_of_day
        .checked_add_days(Days::new(1))
        .ok_or_else(invalid)?;
    Ok(next_day - chrono::Duration::milliseconds(1))
}

// =============================================================================
// Helpers
// =============================================================================

fn customers_by_id(customers: &[Customer]) -> HashMap<RecordId, &Customer> {
    customers.iter().map(|c| (c.id, c)).collect()
}

/// Copies an order with `customer_name` taken from the customer record.
fn with_customer_name(order: &Order, customers: &HashMap<RecordId, &Customer>) -> Order {
    let customer = order.customer_id.and_then(|id| customers.get(&id).copied());
    let contact = CustomerContact::resolve(customer, order.customer_name.as_deref());
    Order {
        customer_name: contact.customer_name,
        ..order.clone()
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// =============================================================================
// Reports
// =============================================================================

/// Dashboard counters, recent orders and best sellers.
///
/// `low_stock_count` counts every product with `remaining_items <= 10`,
/// zero and negative stock included. Top products are ranked by the
/// quantity on order items whose product still exists.
pub fn dashboard(
    products: &[Product],
    orders: &[Order],
    customers: &[Customer],
    order_items: &[OrderItem],
) -> DashboardStats {
    let by_id = customers_by_id(customers);

    let low_stock_count = products
        .iter()
        .filter(|p| p.remaining_items() <= DASHBOARD_LOW_STOCK_LEVEL)
        .count();

    let mut recent_orders: Vec<Order> = orders.iter().map(|o| with_customer_name(o, &by_id)).collect();
    newest_first(&mut recent_orders);
    recent_orders.truncate(DASHBOARD_LIST_SIZE);

    let mut quantities: BTreeMap<RecordId, i64> = BTreeMap::new();
    for item in order_items {
        if let Some(product_id) = item.line.product_id {
            *quantities.entry(product_id).or_default() += item.line.quantity;
        }
    }

    let products_by_id: HashMap<RecordId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut top_products: Vec<TopProduct> = quantities
        .into_iter()
        .filter_map(|(id, quantity)| {
            products_by_id.get(&id).map(|p| TopProduct {
                item_name: p.item_name.clone(),
                item_category: p.item_category.clone(),
                sold_items: quantity,
            })
        })
        .collect();
    top_products.sort_by(|a, b| b.sold_items.cmp(&a.sold_items));
    top_products.truncate(DASHBOARD_LIST_SIZE);

    DashboardStats {
        total_products: products.len(),
        low_stock_count,
        total_orders: orders.len(),
        total_customers: customers.len(),
        recent_orders,
        top_products,
    }
}

/// Per-product stock valuation, sorted by item name.
pub fn inventory(products: &[Product]) -> Vec<InventoryLine> {
    let mut lines: Vec<InventoryLine> = products
        .iter()
        .map(|p| InventoryLine {
            remaining_items: p.remaining_items(),
            total_value: p.total_value(),
            revenue: p.revenue(),
            product: p.clone(),
        })
        .collect();
    lines.sort_by_key(|l| l.product.item_name.to_lowercase());
    lines
}

/// Orders in `range` (all orders when `None`), newest first, with totals.
pub fn sales(orders: &[Order], customers: &[Customer], range: Option<DateRange>) -> SalesReport {
    let by_id = customers_by_id(customers);

    let mut selected: Vec<Order> = orders
        .iter()
        .filter(|o| range.map_or(true, |r| r.contains(o.created_at)))
        .map(|o| with_customer_name(o, &by_id))
        .collect();
    newest_first(&mut selected);

    let total_sales: Money = selected.iter().map(|o| o.total_amount).sum();
    let summary = SalesSummary {
        total_orders: selected.len(),
        total_sales,
        average_order_value: total_sales.average_over(selected.len()),
    };

    SalesReport {
        orders: selected,
        summary,
    }
}

/// Order count and spend per customer, biggest spender first.
pub fn customer_spend(customers: &[Customer], orders: &[Order]) -> Vec<CustomerSpend> {
    let mut report: Vec<CustomerSpend> = customers
        .iter()
        .map(|c| {
            let theirs: Vec<&Order> = orders.iter().filter(|o| o.customer_id == Some(c.id)).collect();
            CustomerSpend {
                customer: c.clone(),
                total_orders: theirs.len(),
                total_spent: theirs.iter().map(|o| o.total_amount).sum(),
            }
        })
        .collect();
    report.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
    report
}

/// Quantity and revenue per product category, highest revenue first.
///
/// Only items whose product still exists are counted, since the category
/// comes from the product.
pub fn category_sales(products: &[Product], order_items: &[OrderItem]) -> Vec<CategorySales> {
    let products_by_id: HashMap<RecordId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut totals: BTreeMap<String, (i64, Money)> = BTreeMap::new();

    for item in order_items {
        let Some(product) = item.line.product_id.and_then(|id| products_by_id.get(&id)) else {
            continue;
        };
        let category = product
            .item_category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let entry = totals.entry(category).or_insert((0, Money::zero()));
        entry.0 += item.line.quantity;
        entry.1 += item.line.subtotal;
    }

    let mut report: Vec<CategorySales> = totals
        .into_iter()
        .map(|(category, (quantity, revenue))| CategorySales {
            category,
            quantity,
            revenue,
        })
        .collect();
    report.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    report
}

// =============================================================================
// Customer Listings
// =============================================================================

fn newest_customers_first<T>(rows: &mut [T], customer: impl Fn(&T) -> &Customer) {
    rows.sort_by(|a, b| customer(b).created_at.cmp(&customer(a).created_at));
}

pub fn customers_with_order_counts(customers: &[Customer], orders: &[Order]) -> Vec<CustomerWithOrderCount> {
    let mut counts: HashMap<RecordId, usize> = HashMap::new();
    for order in orders {
        if let Some(id) = order.customer_id {
            *counts.entry(id).or_default() += 1;
        }
    }

    let mut rows: Vec<CustomerWithOrderCount> = customers
        .iter()
        .map(|c| CustomerWithOrderCount {
            order_count: counts.get(&c.id).copied().unwrap_or(0),
            customer: c.clone(),
        })
        .collect();
    newest_customers_first(&mut rows, |r| &r.customer);
    rows
}

/// Distinct names of products each customer has bought and that still exist.
pub fn customers_with_products(
    customers: &[Customer],
    orders: &[Order],
    order_items: &[OrderItem],
    products: &[Product],
) -> Vec<CustomerWithProducts> {
    let products_by_id: HashMap<RecordId, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut rows: Vec<CustomerWithProducts> = customers
        .iter()
        .map(|c| {
            let order_ids: HashSet<RecordId> = orders
                .iter()
                .filter(|o| o.customer_id == Some(c.id))
                .map(|o| o.id)
                .collect();

            let mut seen = HashSet::new();
            let purchased_products = order_items
                .iter()
                .filter(|i| order_ids.contains(&i.order_id))
                .filter_map(|i| i.line.product_id)
                .filter(|id| seen.insert(*id))
                .filter_map(|id| products_by_id.get(&id).map(|p| p.item_name.clone()))
                .collect();

            CustomerWithProducts {
                customer: c.clone(),
                purchased_products,
            }
        })
        .collect();
    newest_customers_first(&mut rows, |r| &r.customer);
    rows
}

/// Products with `0 < remaining_items <= threshold`.
pub fn low_stock(products: &[Product], threshold: i64) -> Vec<ProductWithStock> {
    products
        .iter()
        .filter(|p| {
            let remaining = p.remaining_items();
            remaining > 0 && remaining <= threshold
        })
        .cloned()
        .map(ProductWithStock::from)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineItem, OrderStatus};
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn product(id: RecordId, name: &str, category: Option<&str>, total: i64, sold: i64) -> Product {
        Product {
            id,
            serial_no: format!("SKU-{:03}", id),
            product_code: None,
            item_name: name.to_string(),
            item_category: category.map(str::to_string),
            unit: "pcs".into(),
            total_stock: total,
            sold_items: sold,
            price: Money::from_cents(1000),
            created_at: at(1),
            updated_at: at(1),
        }
    }

    fn customer(id: RecordId, name: &str, day: u32) -> Customer {
        Customer {
            id,
            customer_name: name.to_string(),
            phone: format!("555-010{}", id),
            email: None,
            address: None,
            created_at: at(day),
            updated_at: at(day),
        }
    }

    fn order(id: RecordId, customer_id: RecordId, cents: i64, day: u32) -> Order {
        Order {
            id,
            order_number: format!("ORD-{}", id),
            customer_id: Some(customer_id),
            customer_name: Some("stale".into()),
            order_date: at(day),
            total_amount: Money::from_cents(cents),
            status: OrderStatus::Completed,
            notes: None,
            payment_method: None,
            created_at: at(day),
            updated_at: at(day),
        }
    }

    fn item(id: RecordId, order_id: RecordId, product_id: RecordId, qty: i64) -> OrderItem {
        OrderItem {
            id,
            order_id,
            line: LineItem {
                product_id: Some(product_id),
                product_name: String::new(),
                quantity: qty,
                unit_price: Money::from_cents(1000),
                subtotal: Money::from_cents(1000 * qty),
            },
            created_at: at(1),
            updated_at: at(1),
        }
    }

    #[test]
    fn test_dashboard_counts_and_rankings() {
        let products = vec![
            product(1, "Headphones", Some("Electronics"), 50, 15),
            product(2, "Mug", Some("Kitchen"), 10, 10),
            product(3, "Lamp", None, 100, 0),
        ];
        let customers = vec![customer(1, "Alice", 1)];
        let orders: Vec<Order> = (1..=7).map(|i| order(i, 1, 1000, i as u32)).collect();
        let items = vec![item(1, 1, 2, 1), item(2, 2, 1, 3), item(3, 3, 99, 50)];

        let stats = dashboard(&products, &orders, &customers, &items);
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.low_stock_count, 1);
        assert_eq!(stats.total_orders, 7);
        assert_eq!(stats.recent_orders.len(), 5);
        assert_eq!(stats.recent_orders[0].id, 7);
        assert_eq!(stats.recent_orders[0].customer_name.as_deref(), Some("Alice"));
        assert_eq!(stats.top_products[0].item_name, "Headphones");
        assert_eq!(stats.top_products[0].sold_items, 3);
        assert_eq!(stats.top_products.len(), 2);
    }

    #[test]
    fn test_inventory_sorted_by_name() {
        let report = inventory(&[
            product(1, "mug", None, 10, 4),
            product(2, "Headphones", None, 50, 15),
        ]);
        assert_eq!(report[0].product.item_name, "Headphones");
        assert_eq!(report[0].remaining_items, 35);
        assert_eq!(report[0].total_value.cents(), 50000);
        assert_eq!(report[1].revenue.cents(), 4000);
    }

    #[test]
    fn test_sales_empty_range_has_zero_summary() {
        let orders = vec![order(1, 1, 1000, 5)];
        let range = DateRange::parse(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        let report = sales(&orders, &[], range);
        assert!(report.orders.is_empty());
        assert_eq!(report.summary.total_orders, 0);
        assert!(report.summary.total_sales.is_zero());
        assert!(report.summary.average_order_value.is_zero());
    }

    #[test]
    fn test_sales_end_date_is_inclusive() {
        let orders = vec![order(1, 1, 1000, 5), order(2, 1, 3000, 6), order(3, 1, 500, 7)];
        let range = DateRange::parse(Some("2024-03-05"), Some("2024-03-06")).unwrap();
        let report = sales(&orders, &[], range);
        assert_eq!(report.summary.total_orders, 2);
        assert_eq!(report.summary.total_sales.cents(), 4000);
        assert_eq!(report.summary.average_order_value.cents(), 2000);
        assert_eq!(report.orders[0].id, 2);
    }

    #[test]
    fn test_date_range_rejects_garbage() {
        assert!(DateRange::parse(Some("yesterday"), Some("2024-03-01")).is_err());
    }

    #[test]
    fn test_customer_spend_descending() {
        let customers = vec![customer(1, "Alice", 1), customer(2, "Bob", 2)];
        let orders = vec![order(1, 1, 1000, 1), order(2, 2, 5000, 1), order(3, 1, 500, 1)];
        let report = customer_spend(&customers, &orders);
        assert_eq!(report[0].customer.customer_name, "Bob");
        assert_eq!(report[1].total_orders, 2);
        assert_eq!(report[1].total_spent.cents(), 1500);
    }

    #[test]
    fn test_category_sales_skips_deleted_products() {
        let products = vec![
            product(1, "Headphones", Some("Electronics"), 50, 0),
            product(2, "Lamp", None, 10, 0),
        ];
        let items = vec![item(1, 1, 1, 2), item(2, 1, 2, 1), item(3, 2, 42, 9)];
        let report = category_sales(&products, &items);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].category, "Electronics");
        assert_eq!(report[0].revenue.cents(), 2000);
        assert_eq!(report[1].category, UNCATEGORIZED);
    }

    #[test]
    fn test_customer_listings() {
        let customers = vec![customer(1, "Alice", 1), customer(2, "Bob", 2)];
        let orders = vec![order(1, 1, 1000, 1), order(2, 1, 1000, 1)];
        let products = vec![product(1, "Headphones", None, 5, 0)];
        let items = vec![item(1, 1, 1, 1), item(2, 2, 1, 1), item(3, 2, 7, 1)];

        let counted = customers_with_order_counts(&customers, &orders);
        assert_eq!(counted[0].customer.customer_name, "Bob");
        assert_eq!(counted[1].order_count, 2);

        let bought = customers_with_products(&customers, &orders, &items, &products);
        assert_eq!(bought[1].purchased_products, vec!["Headphones".to_string()]);
        assert!(bought[0].purchased_products.is_empty());
    }

    #[test]
    fn test_low_stock_excludes_sold_out() {
        let products = vec![
            product(1, "A", None, 10, 10),
            product(2, "B", None, 10, 5),
            product(3, "C", None, 50, 15),
            product(4, "D", None, 1, 3),
        ];
        let low = low_stock(&products, 10);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product.id, 2);
        assert_eq!(low[0].remaining_items, 5);
    }
}
