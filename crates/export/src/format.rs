//! Output formats and the exported artifact.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Standalone HTML print view.
    Print,
    /// Word-compatible HTML markup.
    Word,
    /// `.xlsx` workbook.
    Spreadsheet,
    Pdf,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 4] = [Self::Print, Self::Word, Self::Spreadsheet, Self::Pdf];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Print => "html",
            Self::Word => "doc",
            Self::Spreadsheet => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Print => "text/html; charset=utf-8",
            Self::Word => "application/msword",
            Self::Spreadsheet => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Word => "word",
            Self::Spreadsheet => "spreadsheet",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "print" | "html" => Ok(Self::Print),
            "word" | "doc" => Ok(Self::Word),
            "spreadsheet" | "excel" | "xlsx" => Ok(Self::Spreadsheet),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown export format {other:?} (print, word, spreadsheet, pdf)")),
        }
    }
}

/// One exported invoice document, ready to be written or served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub format: DocumentFormat,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `Invoice_{number}.{ext}`, with anything outside `[A-Za-z0-9-_. ]`
/// replaced by `_`.
pub fn file_name_for(invoice_number: &str, format: DocumentFormat) -> String {
    format!("Invoice_{}.{}", sanitize_filename(invoice_number), format.extension())
}

pub(crate) fn sanitize_filename(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | ' ') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "invoice".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_use_invoice_number() {
        assert_eq!(file_name_for("INV-123456", DocumentFormat::Word), "Invoice_INV-123456.doc");
        assert_eq!(file_name_for("INV-123456", DocumentFormat::Spreadsheet), "Invoice_INV-123456.xlsx");
        assert_eq!(file_name_for("a/b\\c", DocumentFormat::Pdf), "Invoice_a_b_c.pdf");
        assert_eq!(file_name_for("..", DocumentFormat::Print), "Invoice_invoice.html");
        assert_eq!(
            file_name_for("فاتورة", DocumentFormat::Print),
            format!("Invoice_{}.html", "_".repeat(6))
        );
    }

    #[test]
    fn parses_format_aliases() {
        assert_eq!("XLSX".parse::<DocumentFormat>().unwrap(), DocumentFormat::Spreadsheet);
        assert_eq!("html".parse::<DocumentFormat>().unwrap(), DocumentFormat::Print);
        assert!("odt".parse::<DocumentFormat>().is_err());
    }
}
