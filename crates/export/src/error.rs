use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("template rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error("spreadsheet generation failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("pdf generation failed: {0}")]
    Pdf(String),

    #[error("qr code generation failed: {0}")]
    QrCode(String),
}
