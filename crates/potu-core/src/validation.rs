//! # Validation Module
//!
//! Input checks run by the services before the first write, so a rejected
//! request never leaves a half-created order behind.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (React forms)                                       │
//! │  └── Required fields, immediate feedback                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: JSON extraction (axum + serde)                               │
//! │  └── Types: numbers are numbers, statuses are known values             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  └── Business rules: phone present, quantities positive, ...           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::{NewProduct, OrderRequest, ProductPatch};

pub const MAX_NAME_LENGTH: usize = 200;

/// Largest quantity on a single order line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Largest stock level or sold counter a product may be given.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Largest price, line subtotal or order total: one trillion in major units.
pub const MAX_AMOUNT: Money = Money::from_cents(100_000_000_000_000);

// =============================================================================
// String Validators
// =============================================================================

/// Validates the customer phone on an order or pre-order.
///
/// Phone is the customer identity key, so it is returned untouched:
/// `"555-0101"` and `"5550101"` stay different customers.
///
/// ```rust
/// use potu_core::validation::validate_phone;
///
/// assert_eq!(validate_phone(Some("555-0101")).unwrap(), "555-0101");
/// assert!(validate_phone(Some("")).is_err());
/// assert!(validate_phone(None).is_err());
/// ```
pub fn validate_phone(phone: Option<&str>) -> ValidationResult<&str> {
    match phone {
        Some(p) if !p.trim().is_empty() => Ok(p),
        _ => Err(ValidationError::required("Customer phone")),
    }
}

/// Validates a category name and returns it trimmed.
///
/// ```rust
/// use potu_core::validation::validate_category_name;
///
/// assert_eq!(validate_category_name("  Electronics ").unwrap(), "Electronics");
/// assert!(validate_category_name("   ").is_err());
/// ```
pub fn validate_category_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::required("Category name"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "Category name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_string())
}

fn validate_item_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::required("item_name"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "item_name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn too_large(field: &str, max: impl ToString) -> ValidationError {
    ValidationError::TooLarge {
        field: field.to_string(),
        max: max.to_string(),
    }
}

fn stock_level(field: &str, value: i64) -> ValidationResult<()> {
    non_negative(field, value)?;
    if value > MAX_STOCK {
        return Err(too_large(field, MAX_STOCK));
    }
    Ok(())
}

fn amount(field: &str, value: Money) -> ValidationResult<()> {
    non_negative(field, value.cents())?;
    if value > MAX_AMOUNT {
        return Err(too_large(field, MAX_AMOUNT));
    }
    Ok(())
}

/// Validates a product before it is created.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_item_name(&product.item_name)?;
    if let Some(stock) = product.total_stock {
        stock_level("total_stock", stock)?;
    }
    if let Some(price) = product.price {
        amount("price", price)?;
    }
    Ok(())
}

/// Validates the fields a product update actually carries.
pub fn validate_product_patch(patch: &ProductPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.item_name {
        validate_item_name(name)?;
    }
    if let Some(stock) = patch.total_stock {
        stock_level("total_stock", stock)?;
    }
    if let Some(sold) = patch.sold_items {
        stock_level("sold_items", sold)?;
    }
    if let Some(price) = patch.price {
        amount("price", price)?;
    }
    Ok(())
}

// =============================================================================
// Order Validators
// =============================================================================

/// Validates an order or pre-order request.
///
/// ## Rules
/// - `customer_phone` must be non-empty
/// - At least one line item
/// - Every quantity must be positive and at most [`MAX_LINE_QUANTITY`]
/// - Prices, subtotals and the order total stay within [`MAX_AMOUNT`]
///
/// The total is summed with checked arithmetic here, so building the
/// order afterwards cannot overflow.
///
/// ```rust
/// use potu_core::validation::validate_order_request;
/// use potu_core::{LineItemInput, Money, OrderRequest};
///
/// let request = OrderRequest {
///     customer_phone: Some("555-0101".into()),
///     items: vec![LineItemInput {
///         quantity: i64::MAX,
///         unit_price: Money::from_cents(2999),
///         ..LineItemInput::default()
///     }],
///     ..OrderRequest::default()
/// };
/// assert!(validate_order_request(&request).is_err());
/// ```
pub fn validate_order_request(request: &OrderRequest) -> ValidationResult<()> {
    validate_phone(request.customer_phone.as_deref())?;

    if request.items.is_empty() {
        return Err(ValidationError::required("At least one item"));
    }

    let mut total = Money::zero();
    for item in &request.items {
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if item.quantity > MAX_LINE_QUANTITY {
            return Err(too_large("quantity", MAX_LINE_QUANTITY));
        }
        amount("unit_price", item.unit_price)?;

        let subtotal = match item.subtotal {
            Some(given) => given,
            None => item
                .unit_price
                .checked_multiply_quantity(item.quantity)
                .ok_or_else(|| too_large("subtotal", MAX_AMOUNT))?,
        };
        amount("subtotal", subtotal)?;

        total = total
            .checked_add(subtotal)
            .filter(|t| *t <= MAX_AMOUNT)
            .ok_or_else(|| too_large("Order total", MAX_AMOUNT))?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::LineItemInput;

    fn request(phone: Option<&str>, quantities: &[i64]) -> OrderRequest {
        OrderRequest {
            customer_phone: phone.map(str::to_string),
            items: quantities
                .iter()
                .map(|q| LineItemInput {
                    product_id: Some(1),
                    quantity: *q,
                    unit_price: Money::from_cents(100),
                    ..LineItemInput::default()
                })
                .collect(),
            ..OrderRequest::default()
        }
    }

    #[test]
    fn test_missing_phone_is_rejected() {
        let err = validate_order_request(&request(None, &[1])).unwrap_err();
        assert_eq!(err.to_string(), "Customer phone is required");

        assert!(validate_order_request(&request(Some("  "), &[1])).is_err());
    }

    #[test]
    fn test_items_required() {
        let err = validate_order_request(&request(Some("555-0101"), &[])).unwrap_err();
        assert_eq!(err, ValidationError::required("At least one item"));
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(validate_order_request(&request(Some("555-0101"), &[2, 0])).is_err());
        assert!(validate_order_request(&request(Some("555-0101"), &[-1])).is_err());
        assert!(validate_order_request(&request(Some("555-0101"), &[2, 1])).is_ok());
    }

    #[test]
    fn test_oversized_lines_are_rejected() {
        let err = validate_order_request(&request(Some("555-0101"), &[i64::MAX])).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { ref field, .. } if field == "quantity"));

        let mut pricey = request(Some("555-0101"), &[MAX_LINE_QUANTITY]);
        pricey.items[0].unit_price = MAX_AMOUNT;
        let err = validate_order_request(&pricey).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { ref field, .. } if field == "subtotal"));

        let mut saturated = request(Some("555-0101"), &[1]);
        saturated.items[0].unit_price = Money::from_decimal(1e30).unwrap();
        assert!(validate_order_request(&saturated).is_err());

        let mut many = request(Some("555-0101"), &[1, 1, 1]);
        for item in &mut many.items {
            item.subtotal = Some(Money::from_cents(MAX_AMOUNT.cents() / 2));
        }
        let err = validate_order_request(&many).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { ref field, .. } if field == "Order total"));

        let mut negative = request(Some("555-0101"), &[1]);
        negative.items[0].subtotal = Some(Money::from_cents(-100));
        assert!(validate_order_request(&negative).is_err());
    }

    #[test]
    fn test_new_product_rules() {
        let mut product = NewProduct {
            item_name: "Desk Lamp".into(),
            total_stock: Some(10),
            price: Some(Money::from_cents(2500)),
            ..NewProduct::default()
        };
        assert!(validate_new_product(&product).is_ok());

        product.total_stock = Some(-1);
        assert!(validate_new_product(&product).is_err());

        product.total_stock = Some(0);
        product.price = Some(Money::from_cents(-1));
        assert!(validate_new_product(&product).is_err());

        product.price = None;
        product.item_name = " ".into();
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn test_patch_checks_only_present_fields() {
        assert!(validate_product_patch(&ProductPatch::default()).is_ok());

        let patch = ProductPatch {
            total_stock: Some(-5),
            ..ProductPatch::default()
        };
        assert!(validate_product_patch(&patch).is_err());

        let patch = ProductPatch {
            sold_items: Some(i64::MAX),
            ..ProductPatch::default()
        };
        assert!(matches!(
            validate_product_patch(&patch),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_category_name_too_long() {
        let name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(
            validate_category_name(&name),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
