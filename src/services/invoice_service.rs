//! Tax and return invoices rendered as A4 PDFs with the built-in Helvetica
//! fonts. Amounts are carried in paise.

use chrono::{NaiveDate, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use sea_orm::EntityTrait;

use crate::{
    entity::users::Entity as Users,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{DELIVERY_DATE_FORMAT, Order},
    money::{format_paise, percent_of, rupees_to_paise},
    services::order_service::fetch_order,
    state::AppState,
};

const SELLER: [&str; 4] = [
    "NILA PRODUCTS",
    "14/1-1 Andal Avenue, Vellalore",
    "Coimbatore, Tamil Nadu, 641111",
    "GSTIN: 33AQGPM1414L2ZZ",
];
const HALF_GST_BASIS_POINTS: i64 = 250;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 13.0;
const ROW_HEIGHT: f32 = 6.0;
const COLUMNS: [(f32, &str); 7] = [
    (13.0, "Product"),
    (55.0, "Description"),
    (104.0, "Qty"),
    (114.0, "Amount"),
    (136.0, "CGST (2.5%)"),
    (158.0, "SGST (2.5%)"),
    (180.0, "Total"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceKind {
    Tax,
    Return,
}

impl InvoiceKind {
    pub fn title(&self) -> &'static str {
        match self {
            InvoiceKind::Tax => "Tax Invoice",
            InvoiceKind::Return => "Return Invoice",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRow {
    pub product: String,
    pub description: String,
    pub quantity: i32,
    pub amount: i64,
    pub cgst: i64,
    pub sgst: i64,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub title: &'static str,
    pub references: Vec<String>,
    pub date: String,
    pub ship_to: Vec<String>,
    pub rows: Vec<InvoiceRow>,
    pub subtotal: i64,
    pub tax: i64,
    pub grand_total: i64,
}

/// A rendered invoice ready to be served as an attachment.
#[derive(Debug)]
pub struct InvoiceFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub fn build_invoice(
    order: &Order,
    customer_name: &str,
    kind: InvoiceKind,
    date: NaiveDate,
) -> InvoiceDocument {
    let mut references = vec![
        format!("Order ID: {}", order.order_id),
        format!("Invoice ID: {}", order.invoice_id),
    ];
    if kind == InvoiceKind::Return {
        if let Some(return_id) = &order.return_invoice_id {
            references.push(format!("Return ID: {return_id}"));
        }
    }

    let address = match (&order.return_details, kind) {
        (Some(details), InvoiceKind::Return) => &details.pickup_address,
        _ => &order.shipping_address,
    };
    let ship_to = vec![
        customer_name.to_string(),
        format!("{},", address.address),
        format!("{}, {} - {}", address.city, address.state, address.pincode),
        address.country.clone(),
    ];

    let rows: Vec<InvoiceRow> = order
        .items
        .iter()
        .map(|item| {
            let amount = rupees_to_paise(item.line_total());
            let cgst = percent_of(amount, HALF_GST_BASIS_POINTS);
            let sgst = percent_of(amount, HALF_GST_BASIS_POINTS);
            InvoiceRow {
                product: item.name.clone(),
                description: item.description.clone().unwrap_or_else(|| "N/A".into()),
                quantity: item.quantity,
                amount,
                cgst,
                sgst,
                total: amount + cgst + sgst,
            }
        })
        .collect();

    let subtotal = rows.iter().map(|r| r.amount).sum();
    let tax = rows.iter().map(|r| r.cgst + r.sgst).sum();
    let grand_total = rows.iter().map(|r| r.total).sum();

    InvoiceDocument {
        title: kind.title(),
        references,
        date: format!("Date: {}", date.format(DELIVERY_DATE_FORMAT)),
        ship_to,
        rows,
        subtotal,
        tax,
        grand_total,
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

fn rupees(paise: i64) -> String {
    format!("Rs. {}", format_paise(paise))
}

struct PdfWriter {
    doc: printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> AppResult<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn ensure_room(&mut self, rows: f32) {
        if self.y - rows * ROW_HEIGHT >= MARGIN + ROW_HEIGHT {
            return;
        }
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn advance(&mut self, rows: f32) {
        self.y -= rows * ROW_HEIGHT;
    }

    fn finish(self) -> AppResult<Vec<u8>> {
        self.doc.save_to_bytes().map_err(pdf_error)
    }
}

fn pdf_error(err: printpdf::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("pdf rendering failed: {err}"))
}

pub fn render_pdf(invoice: &InvoiceDocument) -> AppResult<Vec<u8>> {
    let mut pdf = PdfWriter::new(invoice.title)?;

    pdf.text(invoice.title, 22.0, MARGIN, true);
    for line in invoice.references.iter().chain(std::iter::once(&invoice.date)) {
        pdf.text(line, 10.0, 140.0, false);
        pdf.advance(1.0);
    }
    pdf.advance(1.5);

    pdf.text("Sold By", 10.0, MARGIN, true);
    pdf.text("Shipping Address", 10.0, 110.0, true);
    pdf.advance(1.0);
    let address_rows = SELLER.len().max(invoice.ship_to.len());
    for i in 0..address_rows {
        if let Some(line) = SELLER.get(i) {
            pdf.text(line, 10.0, MARGIN, i == 0);
        }
        if let Some(line) = invoice.ship_to.get(i) {
            pdf.text(&clip(line, 45), 10.0, 110.0, false);
        }
        pdf.advance(1.0);
    }
    pdf.advance(1.5);

    for (x, header) in COLUMNS {
        pdf.text(header, 9.0, x, true);
    }
    pdf.advance(1.0);

    for row in &invoice.rows {
        pdf.ensure_room(1.0);
        let cells = [
            clip(&row.product, 22),
            clip(&row.description, 26),
            row.quantity.to_string(),
            format_paise(row.amount),
            format_paise(row.cgst),
            format_paise(row.sgst),
            format_paise(row.total),
        ];
        for ((x, _), cell) in COLUMNS.iter().zip(cells.iter()) {
            pdf.text(cell, 9.0, *x, false);
        }
        pdf.advance(1.0);
    }
    pdf.advance(1.0);

    pdf.ensure_room(6.0);
    let totals = [
        ("Subtotal:", invoice.subtotal, false),
        ("Tax (CGST+SGST):", invoice.tax, false),
        ("Grand Total:", invoice.grand_total, true),
    ];
    for (label, amount, bold) in totals {
        pdf.text(label, 10.0, 130.0, bold);
        pdf.text(&rupees(amount), 10.0, 165.0, bold);
        pdf.advance(1.0);
    }
    pdf.advance(2.0);

    pdf.text("Generated via NILA PRODUCTS", 8.0, 85.0, false);
    pdf.advance(1.0);
    pdf.text("This is a computer-generated document.", 8.0, 80.0, false);

    pdf.finish()
}

/// Render the tax or return invoice for one of the caller's orders.
#[tracing::instrument(skip(state, user), fields(user = %user.user_key))]
pub async fn download_invoice(
    state: &AppState,
    user: &AuthUser,
    order_id: String,
    kind: InvoiceKind,
) -> AppResult<InvoiceFile> {
    let not_found = || AppError::NotFound("Order not found.".into());
    let customer = Users::find_by_id(user.user_key.clone())
        .one(&state.orm)
        .await?
        .ok_or_else(not_found)?;
    let order = fetch_order(&state.orm, &customer.user_key, &order_id)
        .await?
        .ok_or_else(not_found)?;

    let filename = match kind {
        InvoiceKind::Tax => format!("NILA-Invoice-{}.pdf", order.invoice_id),
        InvoiceKind::Return => match &order.return_invoice_id {
            Some(return_id) if order.status.is_return_processed() => {
                format!("NILA-Return-Invoice-{return_id}.pdf")
            }
            _ => {
                return Err(AppError::NotFound(
                    "No return invoice exists for this order.".into(),
                ));
            }
        },
    };

    let invoice = build_invoice(&order, &customer.name, kind, Utc::now().date_naive());
    let bytes = render_pdf(&invoice)?;
    tracing::debug!(%filename, bytes = bytes.len(), "invoice rendered");

    Ok(InvoiceFile { filename, bytes })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{AddressSnapshot, OrderLineItem, OrderStatus, ReturnDetails};

    fn order() -> Order {
        Order {
            order_id: "ORD04213".into(),
            invoice_id: "INV77120".into(),
            placed_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            status: OrderStatus::Delivered,
            items: vec![OrderLineItem {
                id: "item002".into(),
                name: "Urban Comfort Kurti".into(),
                price: 1299,
                quantity: 2,
                image: None,
                description: None,
            }],
            shipping_address: AddressSnapshot {
                address: "14 Lake Road".into(),
                city: "Coimbatore".into(),
                state: "Tamil Nadu".into(),
                pincode: "641001".into(),
                country: "India".into(),
                phone: "9876543210".into(),
            },
            total_amount: 2598,
            delivered_at: None,
            delivery_date: None,
            return_invoice_id: None,
            return_details: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
    }

    #[test]
    fn totals_split_gst_into_two_halves() {
        let invoice = build_invoice(&order(), "Alice", InvoiceKind::Tax, date());
        let row = &invoice.rows[0];
        assert_eq!(row.amount, 259_800);
        assert_eq!(row.cgst, 6_495);
        assert_eq!(row.sgst, 6_495);
        assert_eq!(invoice.grand_total, 272_790);
        assert_eq!(invoice.tax, 12_990);
        assert_eq!(row.description, "N/A");
        assert_eq!(invoice.date, "Date: 09-Mar-2025");
        assert_eq!(invoice.references.len(), 2);
    }

    #[test]
    fn return_invoice_uses_pickup_address_and_return_id() {
        let mut order = order();
        order.status = OrderStatus::ReturnRequested;
        order.return_invoice_id = Some("RET00042".into());
        order.return_details = Some(ReturnDetails {
            reason: "Damaged".into(),
            video_url: "https://cdn.example.com/v.mp4".into(),
            pickup_address: AddressSnapshot {
                address: "7 Temple Street".into(),
                city: "Madurai".into(),
                ..Default::default()
            },
            pickup_contact: "9123456780".into(),
            requested_at: Utc::now(),
        });

        let invoice = build_invoice(&order, "Alice", InvoiceKind::Return, date());
        assert_eq!(invoice.title, "Return Invoice");
        assert_eq!(invoice.references.last().unwrap(), "Return ID: RET00042");
        assert_eq!(invoice.ship_to[1], "7 Temple Street,");
    }

    #[test]
    fn renders_a_pdf_across_pages() {
        let mut order = order();
        let item = order.items[0].clone();
        order.items = vec![item; 80];
        let bytes = render_pdf(&build_invoice(&order, "Alice", InvoiceKind::Tax, date())).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn clip_keeps_short_text() {
        assert_eq!(clip("Saree", 10), "Saree");
        assert_eq!(clip("Handloom Cotton Towels", 10), "Handloo...");
    }
}
