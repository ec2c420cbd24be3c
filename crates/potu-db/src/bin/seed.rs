//! # Sample Data Loader
//!
//! Fills a Potu POS database with a small catalog, a few customers and
//! orders for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./potu.db (default)
//! cargo run -p potu-db --bin seed
//!
//! # Specify database path
//! cargo run -p potu-db --bin seed -- --db ./data/potu.db
//!
//! # Empty every collection first
//! cargo run -p potu-db --bin seed -- --clear
//! ```
//!
//! Orders are written the way the order engine writes them: items are
//! snapshotted and each product's `sold_items` moves by the quantity.

use std::env;

use potu_core::{order_total, LineItem, Money, OrderFields, OrderStatus, ProductFields};
use potu_core::{CustomerFields, DEFAULT_PAYMENT_METHOD, DEFAULT_UNIT};
use potu_db::{Database, DbConfig, RecordAccess};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CATEGORIES: &[&str] = &["Electronics", "Accessories", "Office Supplies"];

/// (serial, code, name, category, stock, price in cents)
const PRODUCTS: &[(&str, &str, &str, &str, i64, i64)] = &[
    ("PROD-001", "SKU-001", "Premium Headphones", "Electronics", 50, 8999),
    ("PROD-002", "SKU-002", "Wireless Mouse", "Electronics", 100, 2999),
    ("PROD-003", "SKU-003", "USB-C Cable", "Accessories", 200, 1299),
    ("PROD-004", "SKU-004", "Laptop Stand", "Accessories", 30, 4550),
    ("PROD-005", "SKU-005", "Mechanical Keyboard", "Electronics", 25, 12999),
];

/// (name, phone, email, address)
const CUSTOMERS: &[(&str, &str, &str, &str)] = &[
    ("John Doe", "555-0101", "john.doe@example.com", "123 Main St, New York, NY 10001"),
    ("Jane Smith", "555-0102", "jane.smith@example.com", "456 Oak Ave, Los Angeles, CA 90001"),
    ("Bob Johnson", "555-0103", "bob.johnson@example.com", "789 Pine Rd, Chicago, IL 60601"),
];

/// (customer index, notes, [(product index, quantity)])
const ORDERS: &[(usize, &str, &[(usize, i64)])] = &[
    (0, "First order - electronics bundle", &[(0, 1), (1, 2)]),
    (1, "Office setup", &[(3, 1)]),
    (2, "Bulk purchase", &[(4, 2), (2, 1)]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./potu.db");
    let mut clear = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--clear" => clear = true,
            "--help" | "-h" => {
                println!("Potu POS Sample Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./potu.db)");
                println!("      --clear        Remove all existing records first");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let tx = db.begin().await?;

    if clear {
        let removed = tx.clear_all().await?;
        info!(removed = removed, "Cleared existing records");
    } else if !tx.products().list().await?.is_empty() {
        println!("Database already has products; skipping seed.");
        println!("Run with --clear to start over.");
        return Ok(());
    }

    for name in CATEGORIES {
        tx.categories().insert(name).await?;
    }

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (serial, code, name, category, stock, cents) in PRODUCTS {
        let product = tx
            .products()
            .insert(&ProductFields {
                serial_no: serial.to_string(),
                product_code: Some(code.to_string()),
                item_name: name.to_string(),
                item_category: Some(category.to_string()),
                unit: DEFAULT_UNIT.to_string(),
                total_stock: *stock,
                sold_items: 0,
                price: Money::from_cents(*cents),
            })
            .await?;
        products.push(product);
    }

    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (name, phone, email, address) in CUSTOMERS {
        let customer = tx
            .customers()
            .insert(&CustomerFields {
                customer_name: name.to_string(),
                phone: phone.to_string(),
                email: Some(email.to_string()),
                address: Some(address.to_string()),
            })
            .await?;
        customers.push(customer);
    }

    for (seq, (customer_idx, notes, lines)) in ORDERS.iter().enumerate() {
        let customer = &customers[*customer_idx];
        let items: Vec<LineItem> = lines
            .iter()
            .map(|(product_idx, quantity)| {
                let product = &products[*product_idx];
                LineItem {
                    product_id: Some(product.id),
                    product_name: product.item_name.clone(),
                    quantity: *quantity,
                    unit_price: product.price,
                    subtotal: product.price.multiply_quantity(*quantity),
                }
            })
            .collect();

        let order = tx
            .orders()
            .insert(&OrderFields {
                order_number: format!("ORD-SEED-{:03}", seq + 1),
                customer_id: Some(customer.id),
                customer_name: Some(customer.customer_name.clone()),
                order_date: chrono::Utc::now(),
                total_amount: order_total(&items),
                status: OrderStatus::Completed,
                notes: Some(notes.to_string()),
                payment_method: Some(DEFAULT_PAYMENT_METHOD.to_string()),
            })
            .await?;

        for item in &items {
            tx.orders().insert_item(order.id, item).await?;
            if let Some(product_id) = item.product_id {
                tx.products().adjust_sold_items(product_id, item.quantity).await?;
            }
        }
        info!(order_number = %order.order_number, total = %order.total_amount, "Seeded order");
    }

    tx.commit().await?;

    println!(
        "✓ Seeded {} categories, {} products, {} customers, {} orders",
        CATEGORIES.len(),
        PRODUCTS.len(),
        CUSTOMERS.len(),
        ORDERS.len()
    );

    db.close().await;
    Ok(())
}
