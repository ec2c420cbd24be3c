//! # Customer Notifications
//!
//! Invoice and pre-order confirmation emails.
//!
//! ```text
//! ┌──────────────┐  after commit   ┌──────────────────┐
//! │ Order engine │────────────────►│  dyn Notifier    │
//! └──────────────┘                 │                  │
//!                                  │  SmtpNotifier    │── lettre (STARTTLS)
//!                                  │   + invoice PDF  │
//!                                  │  DisabledNotifier│── log only
//!                                  └──────────────────┘
//! ```
//!
//! Sending never affects the stored data. The order engine logs a failure
//! and carries on.

pub mod email;
pub mod invoice;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use potu_core::{OrderDetails, PreorderDetails};
use thiserror::Error;
use tracing::info;

use crate::config::StoreInfo;

pub use email::SmtpNotifier;
pub use invoice::render_invoice;

/// Errors that can occur while notifying a customer.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Failed to build the message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Attachment content type was rejected.
    #[error("Invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    /// Sender or recipient could not be parsed.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Delivers customer-facing messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the invoice for a completed order, with the PDF attached.
    async fn send_invoice(&self, order: &OrderDetails, recipient: &str) -> Result<(), NotifyError>;

    /// Sends the reservation notice for a new pre-order.
    async fn send_preorder_confirmation(
        &self,
        preorder: &PreorderDetails,
        recipient: &str,
    ) -> Result<(), NotifyError>;
}

/// Used when no SMTP relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send_invoice(&self, order: &OrderDetails, recipient: &str) -> Result<(), NotifyError> {
        info!(
            order_number = %order.order.order_number,
            to = %recipient,
            "Email disabled, invoice not sent"
        );
        Ok(())
    }

    async fn send_preorder_confirmation(
        &self,
        preorder: &PreorderDetails,
        recipient: &str,
    ) -> Result<(), NotifyError> {
        info!(
            preorder_number = %preorder.preorder.preorder_number,
            to = %recipient,
            "Email disabled, confirmation not sent"
        );
        Ok(())
    }
}

/// A timestamp as the shop prints it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalStamp {
    /// `March 5, 2024`
    pub date: String,
    /// `02:30 PM (GMT+6)`
    pub time: String,
}

pub(crate) fn local_stamp(store: &StoreInfo, at: DateTime<Utc>) -> LocalStamp {
    let local = at.naive_utc() + Duration::hours(i64::from(store.utc_offset_hours));
    LocalStamp {
        date: local.format("%B %-d, %Y").to_string(),
        time: format!("{} (GMT{:+})", local.format("%I:%M %p"), store.utc_offset_hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_stamp_uses_store_offset() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 20, 30, 0).unwrap();
        let stamp = local_stamp(&StoreInfo::default(), at);
        assert_eq!(stamp.date, "March 6, 2024");
        assert_eq!(stamp.time, "02:30 AM (GMT+6)");
    }
}
