//! HTML renderings: the print view and the Word-compatible document.

use tera::{Context, Tera};

use crate::document::InvoiceDocument;
use crate::error::ExportError;

const PRINT_TEMPLATE: &str = include_str!("../templates/print.html.tera");
const WORD_TEMPLATE: &str = include_str!("../templates/word.html.tera");

const PRINT: &str = "print.html";
const WORD: &str = "word.html";

/// Word opens UTF-8 HTML correctly only with a byte order mark.
const UTF8_BOM: &str = "\u{feff}";

fn templates() -> Result<Tera, ExportError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![(PRINT, PRINT_TEMPLATE), (WORD, WORD_TEMPLATE)])?;
    Ok(tera)
}

fn render(name: &str, doc: &InvoiceDocument) -> Result<String, ExportError> {
    let tera = templates()?;
    let mut context = Context::new();
    context.insert("doc", doc);
    Ok(tera.render(name, &context)?)
}

pub fn render_print(doc: &InvoiceDocument) -> Result<String, ExportError> {
    render(PRINT, doc)
}

/// Word markup, BOM-prefixed.
pub fn render_word(doc: &InvoiceDocument) -> Result<String, ExportError> {
    let body = render(WORD, doc)?;
    Ok(format!("{UTF8_BOM}{body}"))
}
