//! `salesbook-export` — invoice documents for printing and sharing.
//!
//! One invoice in, one document out: an HTML print view, Word-compatible
//! markup, an `.xlsx` workbook or an A4 PDF. Every format is rendered from
//! the same [`InvoiceDocument`] view model.

pub mod document;
pub mod error;
pub mod format;
pub mod html;
pub mod pdf;
mod shaping;
pub mod spreadsheet;

pub use document::{InvoiceDocument, qr_data_uri, qr_payload};
pub use error::ExportError;
pub use format::{DocumentFormat, ExportedDocument, file_name_for};

use salesbook_invoicing::Invoice;

pub fn export(invoice: &Invoice, format: DocumentFormat) -> Result<ExportedDocument, ExportError> {
    let doc = InvoiceDocument::from_invoice(invoice);

    let bytes = match format {
        DocumentFormat::Print => html::render_print(&doc.with_qr_code()?)?.into_bytes(),
        DocumentFormat::Word => html::render_word(&doc.with_qr_code()?)?.into_bytes(),
        DocumentFormat::Spreadsheet => spreadsheet::render_workbook(&doc)?,
        DocumentFormat::Pdf => pdf::render_pdf(&doc)?,
    };

    tracing::info!(
        invoice_id = %invoice.id(),
        format = %format,
        size = bytes.len(),
        "invoice exported"
    );

    Ok(ExportedDocument {
        format,
        file_name: file_name_for(invoice.invoice_number(), format),
        content_type: format.content_type(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample_invoice;

    #[test]
    fn every_format_names_file_after_invoice_number() {
        let invoice = sample_invoice();
        for format in DocumentFormat::ALL {
            let exported = export(&invoice, format).unwrap();
            assert_eq!(
                exported.file_name,
                format!("Invoice_INV-774411.{}", format.extension())
            );
            assert_eq!(exported.content_type, format.content_type());
            assert!(!exported.bytes.is_empty());
        }
    }

    #[test]
    fn word_export_is_bom_prefixed() {
        let exported = export(&sample_invoice(), DocumentFormat::Word).unwrap();
        assert!(exported.bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
    }
}
