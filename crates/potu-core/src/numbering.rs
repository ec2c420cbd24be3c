//! # Business Numbers
//!
//! Human-facing identifiers derived from the wall clock.
//!
//! | Record   | Format                     | Example                    |
//! |----------|----------------------------|----------------------------|
//! | Order    | `ORD-<millis>`             | `ORD-1718000000123`        |
//! | Preorder | `PRE-<millis>`             | `PRE-1718000000123`        |
//! | Product  | `PROD-<millis>-<4 digits>` | `PROD-1718000000123-4821`  |
//!
//! None of these are checked for collisions. Two orders created in the same
//! millisecond get the same number; the integer `id` stays the real key.

use chrono::{DateTime, Utc};

/// Lowest and highest value of the random serial number suffix.
pub const SERIAL_SUFFIX_RANGE: (u16, u16) = (1000, 9999);

pub fn order_number(now: DateTime<Utc>) -> String {
    format!("ORD-{}", now.timestamp_millis())
}

pub fn preorder_number(now: DateTime<Utc>) -> String {
    format!("PRE-{}", now.timestamp_millis())
}

/// Product serial number. The caller supplies the random suffix so this
/// stays deterministic.
pub fn serial_number(now: DateTime<Utc>, suffix: u16) -> String {
    format!("PROD-{}-{}", now.timestamp_millis(), suffix)
}

/// File name for an order's invoice PDF.
pub fn invoice_file_name(order_number: &str) -> String {
    format!("Invoice_{}.pdf", order_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formats() {
        let now = Utc.timestamp_millis_opt(1_718_000_000_123).unwrap();
        assert_eq!(order_number(now), "ORD-1718000000123");
        assert_eq!(preorder_number(now), "PRE-1718000000123");
        assert_eq!(serial_number(now, 4821), "PROD-1718000000123-4821");
        assert_eq!(
            invoice_file_name("ORD-1718000000123"),
            "Invoice_ORD-1718000000123.pdf"
        );
    }
}
