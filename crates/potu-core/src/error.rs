//! # Error Types
//!
//! Domain-specific error types for potu-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  potu-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  potu-db errors (separate crate)                                       │
//! │  └── DbError          - Record store failures                          │
//! │                                                                         │
//! │  potu-server errors                                                    │
//! │  └── ApiError         - What the HTTP client sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Each variant maps to exactly one HTTP status in the server:
/// the `*NotFound` family to 404, `Validation` to 400 and the rest to 409.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found")]
    ProductNotFound(i64),

    #[error("Category not found")]
    CategoryNotFound(i64),

    #[error("Customer not found")]
    CustomerNotFound(i64),

    #[error("Order not found")]
    OrderNotFound(i64),

    #[error("Pre-order not found")]
    PreorderNotFound(i64),

    /// A category with this name already exists.
    #[error("Category already exists")]
    DuplicateCategory { name: String },

    /// Products still reference the category by name.
    ///
    /// ## When This Occurs
    /// ```text
    /// DELETE /api/categories/3   ("Electronics")
    ///      │
    ///      ▼
    /// 4 products have item_category == "Electronics"
    ///      │
    ///      ▼
    /// CategoryInUse { count: 4 }  → 409, category kept
    /// ```
    #[error("Cannot delete category. {count} product(s) are using this category.")]
    CategoryInUse { name: String, count: usize },

    /// The pre-order was already turned into an order.
    #[error("Pre-order {preorder_number} has already been converted to an order")]
    AlreadyConverted { preorder_number: String },

    /// An invoice was requested for a pre-order that has no order yet.
    #[error("Order not found for this pre-order")]
    PreorderNotConverted(i64),

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for the "record does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_)
                | CoreError::CategoryNotFound(_)
                | CoreError::CustomerNotFound(_)
                | CoreError::OrderNotFound(_)
                | CoreError::PreorderNotFound(_)
                | CoreError::PreorderNotConverted(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before anything is written, so a rejected request leaves the
/// store untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value exceeds the largest amount or count the shop accepts.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: String },

    /// Invalid format (e.g., unparseable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

pub type ValidationResult<T> = Result<T, ValidationError>;
