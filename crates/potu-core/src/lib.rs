//! # potu-core: Pure Business Logic for Potu POS
//!
//! Everything the order engine needs to know that does not touch a disk or a
//! socket lives here: record types, money, validation, number formats and
//! report aggregation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Potu POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (React)                             │   │
//! │  │    Products ──► Orders ──► Pre-orders ──► Reports               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 potu-server (axum routes + services)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ potu-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ numbering │  │  reports  │  │   │
//! │  │   │  Product  │  │   Money   │  │  ORD-...  │  │ dashboard │  │   │
//! │  │   │   Order   │  │  TaxRate  │  │  PRE-...  │  │   sales   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    potu-db (Record Store)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Product, Customer, Order, Preorder, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks run before any write
//! - [`numbering`] - Order, pre-order and serial number formats
//! - [`reports`] - Read-only aggregation over loaded records
//!
//! ## Example Usage
//!
//! ```rust
//! use potu_core::money::Money;
//! use potu_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(17998); // 179.98
//! let vat = subtotal.calculate_tax(TaxRate::from_bps(1000));
//! assert_eq!(vat.cents(), 1800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod reports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit assigned to products created without one.
pub const DEFAULT_UNIT: &str = "pcs";

/// Default `threshold` for the low-stock alert query.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Remaining-stock level at or below which the dashboard counts a product
/// as low on stock. Zero and negative stock are included.
pub const DASHBOARD_LOW_STOCK_LEVEL: i64 = 10;

/// Number of entries in the dashboard's recent-orders and top-products lists.
pub const DASHBOARD_LIST_SIZE: usize = 5;

/// Payment method printed on invoices when the caller gives none.
pub const DEFAULT_PAYMENT_METHOD: &str = "CASH";

/// VAT applied at presentation time only (invoice PDF and email).
/// Stored order totals never include it.
pub const DEFAULT_VAT_BPS: u32 = 1000;
