//! Single-sheet `.xlsx` workbook.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::document::InvoiceDocument;
use crate::error::ExportError;

const SHEET_NAME: &str = "فاتورة";
const DOTS: &str = "....................";

pub fn render_workbook(doc: &InvoiceDocument) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        sheet.set_right_to_left(true);
        write_rows(sheet, doc)?;
    }
    Ok(workbook.save_to_buffer()?)
}

fn write_rows(sheet: &mut Worksheet, doc: &InvoiceDocument) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();

    sheet.set_column_width(0, 22)?;
    sheet.set_column_width(1, 22)?;
    sheet.set_column_width(2, 18)?;
    sheet.set_column_width(3, 22)?;

    sheet.write_string_with_format(0, 0, "فاتورة مبيعات", &bold)?;
    sheet.write_string_with_format(0, 3, &doc.company_name, &bold)?;

    sheet.write_string(1, 0, "رقم الفاتورة:")?;
    sheet.write_string(1, 1, &doc.invoice_number)?;
    sheet.write_string(1, 3, "التاريخ:")?;
    sheet.write_string(1, 4, &doc.order_date)?;

    sheet.write_string(2, 0, "اسم العميل:")?;
    sheet.write_string(2, 1, &doc.customer_name)?;
    sheet.write_string(3, 0, "الهاتف:")?;
    sheet.write_string(3, 1, doc.phones())?;
    sheet.write_string(4, 0, "العنوان:")?;
    sheet.write_string(4, 1, &doc.address)?;

    for (col, header) in ["اسم الصنف", "العدد", "السعر الإفرادي", "الإجمالي"].into_iter().enumerate() {
        sheet.write_string_with_format(6, col as u16, header, &bold)?;
    }
    sheet.write_string(7, 0, &doc.product_name)?;
    sheet.write_number(7, 1, doc.quantity)?;
    sheet.write_number(7, 2, doc.amounts.unit_price)?;
    sheet.write_number(7, 3, doc.amounts.line_total)?;

    sheet.write_string(9, 2, "مصاريف التوصيل:")?;
    sheet.write_number(9, 3, doc.amounts.shipping_cost)?;
    sheet.write_string_with_format(10, 2, "الإجمالي النهائي:", &bold)?;
    sheet.write_number_with_format(10, 3, doc.amounts.total, &bold)?;

    sheet.write_string(12, 0, "تم الاستلام بواسطة:")?;
    sheet.write_string(12, 1, DOTS)?;
    sheet.write_string(12, 2, "توقيع الشركة:")?;
    sheet.write_string(12, 3, DOTS)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample_invoice;

    #[test]
    fn produces_a_zip_container() {
        let bytes = render_workbook(&InvoiceDocument::from_invoice(&sample_invoice())).unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert!(bytes.len() > 1000);
    }
}
