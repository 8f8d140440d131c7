//! Presentation model shared by every output format.

use base64::Engine as _;
use base64::engine::general_purpose;
use qrcode_generator::QrCodeEcc;
use serde::Serialize;

use salesbook_invoicing::Invoice;

use crate::error::ExportError;

pub const CURRENCY: &str = "ج.م";

const QR_SIZE_PX: usize = 250;

/// A fully resolved invoice, flattened into display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDocument {
    pub page_title: String,
    pub company_name: String,
    pub company_logo: Option<String>,
    pub watermark_text: Option<String>,

    pub invoice_number: String,
    pub order_date: String,

    pub customer_name: String,
    pub phone1: String,
    pub phone2: String,
    pub address: String,
    pub governorate: Option<String>,

    pub product_name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub shipping_cost: String,
    pub total: String,
    pub currency: &'static str,

    /// What the QR code encodes.
    pub qr_payload: String,
    /// PNG data URI, filled by [`InvoiceDocument::with_qr_code`].
    pub qr_code: Option<String>,

    #[serde(skip)]
    pub(crate) amounts: Amounts,
}

/// Raw amounts for formats that store numbers rather than text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct Amounts {
    pub unit_price: f64,
    pub line_total: f64,
    pub shipping_cost: f64,
    pub total: f64,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl InvoiceDocument {
    pub fn from_invoice(invoice: &Invoice) -> Self {
        let details = invoice.details();
        let line_total = invoice.line_revenue();

        Self {
            page_title: details.page_title.clone(),
            company_name: details.company_name.clone(),
            company_logo: non_blank(details.company_logo.as_deref()),
            watermark_text: non_blank(details.watermark_text.as_deref()),
            invoice_number: details.invoice_number.clone(),
            order_date: invoice.order_date().format("%Y-%m-%d").to_string(),
            customer_name: details.customer_name.clone(),
            phone1: details.phone1.clone(),
            phone2: details.phone2.clone(),
            address: details.address.clone(),
            governorate: invoice.governorate().map(|g| g.arabic_name().to_string()),
            product_name: details.product_name.clone(),
            quantity: invoice.quantity(),
            unit_price: invoice.price().to_string(),
            line_total: line_total.to_string(),
            shipping_cost: invoice.shipping_cost().to_string(),
            total: invoice.total().to_string(),
            currency: CURRENCY,
            qr_payload: qr_payload(invoice),
            qr_code: None,
            amounts: Amounts {
                unit_price: invoice.price().to_f64(),
                line_total: line_total.to_f64(),
                shipping_cost: invoice.shipping_cost().to_f64(),
                total: invoice.total().to_f64(),
            },
        }
    }

    /// Render [`qr_payload`](Self::qr_payload) as a PNG data URI.
    pub fn with_qr_code(mut self) -> Result<Self, ExportError> {
        self.qr_code = Some(qr_data_uri(&self.qr_payload)?);
        Ok(self)
    }

    /// `phone1 / phone2`, or just `phone1`.
    pub fn phones(&self) -> String {
        match self.phone2.trim() {
            "" => self.phone1.clone(),
            second => format!("{} / {second}", self.phone1),
        }
    }
}

/// The website URL when set, otherwise `"{company} | {number} | {total}"`.
pub fn qr_payload(invoice: &Invoice) -> String {
    let details = invoice.details();
    match non_blank(details.website_url.as_deref()) {
        Some(url) => url,
        None => format!(
            "{} | {} | {}",
            details.company_name,
            details.invoice_number,
            invoice.total()
        ),
    }
}

pub fn qr_data_uri(text: &str) -> Result<String, ExportError> {
    let png = qrcode_generator::to_png_to_vec(text, QrCodeEcc::Medium, QR_SIZE_PX)
        .map_err(|e| ExportError::QrCode(e.to_string()))?;
    Ok(format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png)))
}
