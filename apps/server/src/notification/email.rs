//! SMTP delivery via lettre, rendered with Askama templates.
//!
//! Invoices go out as `multipart/mixed`: a text/HTML alternative plus the
//! PDF from [`render_invoice`](super::render_invoice).

use askama::Template;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use potu_core::numbering::invoice_file_name;
use potu_core::{Money, OrderDetails, PreorderDetails};
use tracing::info;

use super::{invoice, local_stamp, Notifier, NotifyError};
use crate::config::{SmtpConfig, StoreInfo};

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "email/invoice.html")]
struct InvoiceEmailHtml<'a> {
    mail: &'a InvoiceMail<'a>,
}

#[derive(Template)]
#[template(path = "email/invoice.txt")]
struct InvoiceEmailText<'a> {
    mail: &'a InvoiceMail<'a>,
}

#[derive(Template)]
#[template(path = "email/preorder_confirmation.html")]
struct PreorderEmailHtml<'a> {
    mail: &'a PreorderMail<'a>,
}

#[derive(Template)]
#[template(path = "email/preorder_confirmation.txt")]
struct PreorderEmailText<'a> {
    mail: &'a PreorderMail<'a>,
}

/// Values shared by both invoice bodies.
struct InvoiceMail<'a> {
    store: &'a StoreInfo,
    customer_name: &'a str,
    order_number: &'a str,
    date: String,
    time: String,
    payment_method: &'a str,
    total_with_tax: String,
    tax_percent: String,
}

struct PreorderMail<'a> {
    store: &'a StoreInfo,
    customer_name: &'a str,
    customer_phone: &'a str,
    preorder_number: &'a str,
    date: String,
    items: Vec<ItemRow>,
    total: String,
}

struct ItemRow {
    name: String,
    quantity: i64,
    price: String,
    subtotal: String,
}

fn with_currency(value: Money, store: &StoreInfo) -> String {
    format!("{} {}", value, store.currency)
}

fn display_name(name: Option<&str>) -> &str {
    name.filter(|n| !n.trim().is_empty()).unwrap_or("Valued Customer")
}

impl<'a> InvoiceMail<'a> {
    fn new(store: &'a StoreInfo, order: &'a OrderDetails) -> Self {
        let stamp = local_stamp(store, order.order.order_date);
        let subtotal = order.order.total_amount;
        let total = subtotal + subtotal.calculate_tax(store.tax_rate());
        InvoiceMail {
            store,
            customer_name: display_name(order.contact.customer_name.as_deref()),
            order_number: &order.order.order_number,
            date: stamp.date,
            time: stamp.time,
            payment_method: order.order.payment_method_or_default(),
            total_with_tax: with_currency(total, store),
            tax_percent: store.tax_rate().percentage().to_string(),
        }
    }
}

impl<'a> PreorderMail<'a> {
    fn new(store: &'a StoreInfo, preorder: &'a PreorderDetails) -> Self {
        let stamp = local_stamp(store, preorder.preorder.order_date);
        let items = preorder
            .items
            .iter()
            .map(|item| ItemRow {
                name: item.line.product_name.clone(),
                quantity: item.line.quantity,
                price: with_currency(item.line.unit_price, store),
                subtotal: with_currency(item.line.subtotal, store),
            })
            .collect();
        PreorderMail {
            store,
            customer_name: display_name(preorder.contact.customer_name.as_deref()),
            customer_phone: preorder.contact.customer_phone.as_deref().unwrap_or("N/A"),
            preorder_number: &preorder.preorder.preorder_number,
            date: stamp.date,
            items,
            total: with_currency(preorder.preorder.total_amount, store),
        }
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Sends customer mail through an SMTP relay.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    store: StoreInfo,
}

impl SmtpNotifier {
    /// Builds the STARTTLS transport. No connection is made until the
    /// first send.
    pub fn new(config: &SmtpConfig, store: StoreInfo) -> Result<Self, NotifyError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        let address: Address = config
            .from_address
            .parse()
            .map_err(|_| NotifyError::InvalidAddress(config.from_address.clone()))?;

        Ok(Self {
            mailer,
            from: Mailbox::new(Some(config.from_name.clone()), address),
            store,
        })
    }

    fn recipient(to: &str) -> Result<Mailbox, NotifyError> {
        to.parse()
            .map_err(|_| NotifyError::InvalidAddress(to.to_string()))
    }

    fn alternative(text_body: String, html_body: String) -> MultiPart {
        MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(text_body),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(html_body),
            )
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_invoice(&self, order: &OrderDetails, to: &str) -> Result<(), NotifyError> {
        let mail = InvoiceMail::new(&self.store, order);
        let html = InvoiceEmailHtml { mail: &mail }.render()?;
        let text = InvoiceEmailText { mail: &mail }.render()?;

        let pdf = invoice::render_invoice(&self.store, order);
        let pdf_type = ContentType::parse("application/pdf")?;
        let attachment = Attachment::new(invoice_file_name(&order.order.order_number)).body(pdf, pdf_type);

        let subject = format!(
            "Invoice #{} - {}",
            order.order.order_number,
            self.from.name.as_deref().unwrap_or(&self.store.name)
        );
        let email = Message::builder()
            .from(self.from.clone())
            .to(Self::recipient(to)?)
            .subject(&subject)
            .multipart(
                MultiPart::mixed()
                    .multipart(Self::alternative(text, html))
                    .singlepart(attachment),
            )?;

        self.mailer.send(email).await?;

        info!(to = %to, order_number = %order.order.order_number, "Invoice email sent");
        Ok(())
    }

    async fn send_preorder_confirmation(
        &self,
        preorder: &PreorderDetails,
        to: &str,
    ) -> Result<(), NotifyError> {
        let mail = PreorderMail::new(&self.store, preorder);
        let html = PreorderEmailHtml { mail: &mail }.render()?;
        let text = PreorderEmailText { mail: &mail }.render()?;

        let subject = format!("Pre-Order Confirmation - {}", preorder.preorder.preorder_number);
        let email = Message::builder()
            .from(self.from.clone())
            .to(Self::recipient(to)?)
            .subject(&subject)
            .multipart(Self::alternative(text, html))?;

        self.mailer.send(email).await?;

        info!(
            to = %to,
            preorder_number = %preorder.preorder.preorder_number,
            "Pre-order confirmation sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use potu_core::{CustomerContact, LineItem, Preorder, PreorderItem, PreorderStatus};

    fn preorder() -> PreorderDetails {
        let now = Utc::now();
        PreorderDetails {
            preorder: Preorder {
                id: 1,
                preorder_number: "PRE-1700000000000".into(),
                customer_id: None,
                customer_name: None,
                order_date: now,
                total_amount: Money::from_cents(4550),
                status: PreorderStatus::Pending,
                notes: None,
                converted_order_id: None,
                created_at: now,
                updated_at: now,
            },
            contact: CustomerContact {
                customer_name: Some("Bob <b>".into()),
                ..CustomerContact::default()
            },
            items: vec![PreorderItem {
                id: 1,
                preorder_id: 1,
                line: LineItem {
                    product_id: Some(4),
                    product_name: "Laptop Stand".into(),
                    quantity: 1,
                    unit_price: Money::from_cents(4550),
                    subtotal: Money::from_cents(4550),
                },
                created_at: now,
                updated_at: now,
            }],
        }
    }

    #[test]
    fn test_preorder_templates_render() {
        let store = StoreInfo::default();
        let details = preorder();
        let mail = PreorderMail::new(&store, &details);

        let html = PreorderEmailHtml { mail: &mail }.render().unwrap();
        assert!(html.contains("PRE-1700000000000"));
        assert!(html.contains("Laptop Stand"));
        assert!(html.contains("45.50 BDT"));
        assert!(html.contains("Bob &#60;b&#62;") || html.contains("Bob &lt;b&gt;"));

        let text = PreorderEmailText { mail: &mail }.render().unwrap();
        assert!(text.contains("Bob <b>"));
        assert!(text.contains("N/A"));
    }

    #[test]
    fn test_display_name_falls_back() {
        assert_eq!(display_name(None), "Valued Customer");
        assert_eq!(display_name(Some("  ")), "Valued Customer");
        assert_eq!(display_name(Some("Jane")), "Jane");
    }
}
