//! # Invoice PDF
//!
//! Renders an order as a small PDF 1.4 document using only the standard
//! Helvetica fonts, so no font files or PDF crate are needed.
//!
//! ## Layout (A4, top to bottom)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HEY POTU                                               INVOICE        │
//! │  tagline / address / email                                             │
//! │─────────────────────────────────────────────────────────────────────────│
//! │  Invoice Number / Date / Time / Payment     BILL TO: name, contact     │
//! │                                                                         │
//! │  SL  DESCRIPTION              QTY     UNIT PRICE        AMOUNT         │
//! │  1   Premium Headphones        2      89.99 BDT      179.98 BDT        │
//! │─────────────────────────────────────────────────────────────────────────│
//! │                                      Subtotal:       179.98 BDT        │
//! │                                      VAT (10%):       18.00 BDT        │
//! │                                      TOTAL AMOUNT:   197.98 BDT        │
//! │  TERMS & CONDITIONS                  AUTHORIZED SIGNATURE              │
//! │                  THANK YOU FOR YOUR BUSINESS!                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Item rows that don't fit continue on further pages.
//!
//! Tax is computed here for presentation only. `total_amount` on the order
//! never includes it.

use potu_core::{Money, OrderDetails};
use tracing::warn;

use super::local_stamp;
use crate::config::StoreInfo;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const LEFT: f32 = 50.0;
const RIGHT: f32 = 550.0;
const ROW_HEIGHT: f32 = 28.0;
const TABLE_TOP: f32 = 290.0;
/// Rows stop here; the totals, terms and footer need the rest.
const ROWS_BOTTOM: f32 = 520.0;
const CONTINUED_TOP: f32 = 80.0;

const TERMS: [&str; 3] = [
    "- Payment is due upon receipt of invoice",
    "- Please keep this invoice for warranty claims",
    "- All sales are final unless otherwise stated",
];

// =============================================================================
// Drawing Primitives
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Right,
    Center,
}

/// One page of drawing operators. Coordinates are measured from the top
/// of the page and flipped when written.
#[derive(Debug, Default)]
struct Page {
    content: String,
}

impl Page {
    fn text(&mut self, font: Font, size: f32, x: f32, y: f32, text: &str) {
        self.content.push_str(&format!(
            "BT /{} {} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            font.resource(),
            size,
            x,
            PAGE_HEIGHT - y - size,
            escape(text)
        ));
    }

    /// Text aligned inside the box starting at `x` with `width`.
    fn text_in(&mut self, font: Font, size: f32, x: f32, y: f32, width: f32, align: Align, text: &str) {
        let measured = text_width(text, size);
        let start = match align {
            Align::Left => x,
            Align::Right => x + width - measured,
            Align::Center => x + (width - measured) / 2.0,
        };
        self.text(font, size, start, y, text);
    }

    fn rule(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.content.push_str(&format!(
            "{:.2} {:.2} m {:.2} {:.2} l S\n",
            x1,
            PAGE_HEIGHT - y1,
            x2,
            PAGE_HEIGHT - y2
        ));
    }

    fn frame(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.content.push_str(&format!(
            "{:.2} {:.2} {:.2} {:.2} re S\n",
            x,
            PAGE_HEIGHT - y - height,
            width,
            height
        ));
    }
}

/// Escapes a string for a PDF literal.
///
/// The standard fonts use WinAnsi encoding, so Latin-1 letters and the
/// WinAnsi punctuation (dashes, curly quotes, euro sign) are written as
/// octal escapes. The literal stays ASCII. Anything else becomes `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lossy = 0usize;
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => match win_ansi_byte(c) {
                Some(byte) => out.push_str(&format!("\\{:03o}", byte)),
                None => {
                    lossy += 1;
                    out.push('?');
                }
            },
        }
    }
    if lossy > 0 {
        warn!(replaced = lossy, text = %text, "Invoice text has characters the PDF font cannot show");
    }
    out
}

/// WinAnsiEncoding code for a non-ASCII character.
fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\u{a0}'..='\u{ff}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => return None,
    };
    Some(byte)
}

/// Rough Helvetica advance width. Good enough for right-aligning amounts.
fn text_width(text: &str, size: f32) -> f32 {
    let units: f32 = text
        .chars()
        .map(|c| match c {
            ' ' | '.' | ',' | ':' | 'i' | 'l' | 'I' | 'j' | 't' | 'f' => 278.0,
            'm' | 'w' | 'M' | 'W' => 833.0,
            'A'..='Z' => 667.0,
            _ => 556.0,
        })
        .sum();
    units * size / 1000.0
}

fn amount(value: Money, currency: &str) -> String {
    format!("{} {}", value, currency)
}

// =============================================================================
// Invoice
// =============================================================================

/// Renders `order` as a PDF invoice.
pub fn render_invoice(store: &StoreInfo, order: &OrderDetails) -> Vec<u8> {
    let currency = store.currency.as_str();
    let stamp = local_stamp(store, order.order.order_date);

    let mut pages = Vec::new();
    let mut page = Page::default();

    // Header
    page.text(Font::Bold, 24.0, 150.0, 50.0, &store.name);
    let mut y = 78.0;
    page.text(Font::Regular, 10.0, 150.0, y, &store.tagline);
    for line in &store.address_lines {
        y += 14.0;
        page.text(Font::Regular, 10.0, 150.0, y, line);
    }
    page.text(Font::Regular, 10.0, 150.0, y + 14.0, &format!("Email: {}", store.email));
    page.frame(420.0, 45.0, 130.0, 50.0);
    page.text_in(Font::Bold, 26.0, 420.0, 57.0, 130.0, Align::Center, "INVOICE");
    page.rule(LEFT, 150.0, RIGHT, 150.0);

    // Invoice details
    let details = [
        ("Invoice Number:", order.order.order_number.clone()),
        ("Invoice Date:", stamp.date),
        ("Invoice Time:", stamp.time),
        ("Payment Method:", order.order.payment_method_or_default().to_string()),
    ];
    for (i, (label, value)) in details.iter().enumerate() {
        let row_y = 170.0 + i as f32 * 20.0;
        page.text(Font::Bold, 10.0, LEFT, row_y, label);
        page.text(Font::Regular, 10.0, 150.0, row_y, value);
    }

    // Bill to
    let contact = &order.contact;
    page.text(Font::Bold, 11.0, 350.0, 170.0, "BILL TO:");
    let name = contact
        .customer_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("Walk-in Customer");
    page.text(Font::Bold, 12.0, 350.0, 190.0, name);
    let mut bill_y = 190.0;
    let lines = [
        ("Phone: ", &contact.customer_phone),
        ("Email: ", &contact.customer_email),
        ("Address: ", &contact.customer_address),
    ];
    for (label, value) in lines {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            bill_y += 16.0;
            page.text(Font::Regular, 9.0, 350.0, bill_y, &format!("{}{}", label, value));
        }
    }

    // Items
    let mut row_y = table_header(&mut page, TABLE_TOP);
    for (index, item) in order.items.iter().enumerate() {
        if row_y + ROW_HEIGHT > ROWS_BOTTOM {
            pages.push(std::mem::take(&mut page));
            row_y = table_header(&mut page, CONTINUED_TOP);
        }
        let line = &item.line;
        let text_y = row_y + 9.0;
        page.text_in(Font::Regular, 9.0, 60.0, text_y, 30.0, Align::Center, &(index + 1).to_string());
        page.text(Font::Bold, 10.0, 100.0, text_y, &line.product_name);
        page.text_in(Font::Regular, 9.0, 310.0, text_y, 50.0, Align::Center, &line.quantity.to_string());
        page.text_in(Font::Regular, 9.0, 370.0, text_y, 80.0, Align::Right, &amount(line.unit_price, currency));
        page.text_in(Font::Bold, 9.0, 460.0, text_y, 80.0, Align::Right, &amount(line.subtotal, currency));
        row_y += ROW_HEIGHT;
    }
    page.rule(LEFT, row_y, RIGHT, row_y);

    // Totals
    let subtotal = order.order.total_amount;
    let tax = subtotal.calculate_tax(store.tax_rate());
    let totals = [
        ("Subtotal:".to_string(), subtotal, Font::Regular, 10.0),
        (format!("VAT ({}%):", store.tax_rate().percentage()), tax, Font::Regular, 10.0),
        ("TOTAL AMOUNT:".to_string(), subtotal + tax, Font::Bold, 13.0),
    ];
    let mut total_y = row_y + 20.0;
    for (label, value, font, size) in totals {
        page.text_in(font, size, 340.0, total_y, 120.0, Align::Right, &label);
        page.text_in(Font::Bold, size, 460.0, total_y, 90.0, Align::Right, &amount(value, currency));
        total_y += 22.0;
    }

    // Terms and signature
    let box_y = total_y + 30.0;
    page.frame(LEFT, box_y, 240.0, 80.0);
    page.text(Font::Bold, 11.0, 60.0, box_y + 10.0, "TERMS & CONDITIONS");
    for (i, term) in TERMS.iter().enumerate() {
        page.text(Font::Regular, 8.0, 60.0, box_y + 28.0 + i as f32 * 12.0, term);
    }
    page.frame(310.0, box_y, 240.0, 80.0);
    page.text(Font::Bold, 11.0, 320.0, box_y + 10.0, "AUTHORIZED SIGNATURE");
    page.rule(330.0, box_y + 55.0, 520.0, box_y + 55.0);
    page.text_in(Font::Regular, 9.0, 330.0, box_y + 60.0, 190.0, Align::Center, "Manager / Authorized Person");

    // Footer
    page.text_in(Font::Bold, 12.0, LEFT, 742.0, 500.0, Align::Center, "THANK YOU FOR YOUR BUSINESS!");
    page.text_in(
        Font::Regular,
        8.0,
        LEFT,
        762.0,
        500.0,
        Align::Center,
        &format!("For any queries, contact us at {} or visit our store", store.email),
    );

    pages.push(page);
    assemble(&pages)
}

/// Draws the column headings and returns the y of the first row.
fn table_header(page: &mut Page, top: f32) -> f32 {
    page.frame(LEFT, top, 500.0, 30.0);
    let y = top + 10.0;
    page.text_in(Font::Bold, 10.0, 60.0, y, 30.0, Align::Center, "SL");
    page.text(Font::Bold, 10.0, 100.0, y, "DESCRIPTION");
    page.text_in(Font::Bold, 10.0, 310.0, y, 50.0, Align::Center, "QTY");
    page.text_in(Font::Bold, 10.0, 370.0, y, 80.0, Align::Right, "UNIT PRICE");
    page.text_in(Font::Bold, 10.0, 460.0, y, 80.0, Align::Right, "AMOUNT");
    top + 30.0
}

// =============================================================================
// File Assembly
// =============================================================================

/// Writes the object graph, cross-reference table and trailer.
///
/// ```text
/// 1 Catalog ─► 2 Pages ─► page objects (5, 7, ...) ─► content streams (6, 8, ...)
///              3 Font Helvetica, 4 Font Helvetica-Bold
/// ```
fn assemble(pages: &[Page]) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 5 + i * 2).collect();

    let mut objects: Vec<String> = Vec::with_capacity(4 + pages.len() * 2);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string());
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>".to_string());

    for (page, id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            page.content.len(),
            page.content
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));
    out.into_bytes()
}
