//! A4 PDF with an embedded DejaVu Sans.
//!
//! Labels are English. Field values may be in any script the font covers;
//! Arabic is shaped and reordered before drawing (see [`crate::shaping`]).
//! The page is laid out first as a list of items so the text that reaches
//! the PDF can be inspected without decoding content streams.

use std::io::BufWriter;

use printpdf::{IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

use crate::document::InvoiceDocument;
use crate::error::ExportError;
use crate::shaping::visual;

pub(crate) const FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

const LEFT: f32 = 15.0;
const RIGHT: f32 = 195.0;

fn pdf_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(e.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    /// Text in drawing order at (`x`, `y`) mm from the bottom-left corner.
    Text { text: String, size: f32, x: f32, y: f32 },
    /// Horizontal rule across the content width.
    Rule { y: f32 },
}

#[derive(Default)]
struct Layout {
    items: Vec<Item>,
}

impl Layout {
    fn text(&mut self, text: &str, size: f32, x: f32, y: f32) {
        if text.trim().is_empty() {
            return;
        }
        self.items.push(Item::Text {
            text: visual(text),
            size,
            x,
            y,
        });
    }

    fn rule(&mut self, y: f32) {
        self.items.push(Item::Rule { y });
    }
}

pub(crate) fn layout(doc: &InvoiceDocument) -> Vec<Item> {
    let mut page = Layout::default();
    let money = |amount: &str| format!("{amount} EGP");

    // Header
    page.text(&doc.company_name, 18.0, LEFT, 280.0);
    page.text(&doc.page_title, 10.0, LEFT, 273.0);
    page.text("INVOICE", 22.0, 150.0, 280.0);
    page.text(&doc.invoice_number, 11.0, 150.0, 273.0);
    if let Some(watermark) = &doc.watermark_text {
        page.text(watermark, 10.0, 150.0, 267.0);
    }
    page.rule(262.0);

    // Customer block
    let mut y = 254.0;
    let details = [
        ("Date", doc.order_date.clone()),
        ("Customer", doc.customer_name.clone()),
        ("Phone", doc.phones()),
        ("Address", doc.address.clone()),
    ];
    for (label, value) in details {
        page.text(&format!("{label}:"), 10.0, LEFT, y);
        page.text(&value, 10.0, 45.0, y);
        y -= 6.0;
    }

    // Line item
    y -= 6.0;
    page.rule(y + 5.0);
    for (x, header) in [(LEFT, "Item"), (100.0, "Qty"), (125.0, "Unit price"), (165.0, "Line total")] {
        page.text(header, 10.0, x, y);
    }
    y -= 8.0;
    page.text(&doc.product_name, 10.0, LEFT, y);
    page.text(&doc.quantity.to_string(), 10.0, 100.0, y);
    page.text(&money(&doc.unit_price), 10.0, 125.0, y);
    page.text(&money(&doc.line_total), 10.0, 165.0, y);
    page.rule(y - 4.0);

    // Totals
    y -= 14.0;
    page.text("Shipping:", 10.0, 125.0, y);
    page.text(&money(&doc.shipping_cost), 10.0, 165.0, y);
    y -= 8.0;
    page.text("Total:", 12.0, 125.0, y);
    page.text(&money(&doc.total), 12.0, 165.0, y);

    // Signature
    page.text("Customer signature: ................................", 10.0, LEFT, 40.0);

    page.items
}

fn draw(layer: &PdfLayerReference, font: &IndirectFontRef, item: &Item) {
    match item {
        Item::Text { text, size, x, y } => layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), font),
        Item::Rule { y } => layer.add_line(Line {
            points: vec![
                (Point::new(Mm(LEFT), Mm(*y)), false),
                (Point::new(Mm(RIGHT), Mm(*y)), false),
            ],
            is_closed: false,
        }),
    }
}

pub fn render_pdf(doc: &InvoiceDocument) -> Result<Vec<u8>, ExportError> {
    let title = format!("Invoice {}", doc.invoice_number);
    let (pdf, page, layer) = PdfDocument::new(&title, Mm(210.0), Mm(297.0), "Layer 1");
    let font = pdf.add_external_font(FONT).map_err(pdf_err)?;
    let layer = pdf.get_page(page).get_layer(layer);

    for item in layout(doc) {
        draw(&layer, &font, &item);
    }

    let mut writer = BufWriter::new(Vec::<u8>::new());
    pdf.save(&mut writer).map_err(pdf_err)?;
    writer.into_inner().map_err(pdf_err)
}
