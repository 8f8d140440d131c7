//! Terminal rendering of invoices and reports.

use comfy_table::{Attribute, Cell, CellAlignment, Table};

use salesbook_core::Money;
use salesbook_invoicing::{Invoice, ProfitRow, SalesReport};

fn amount(value: Money) -> Cell {
    Cell::new(value.to_display_2dp()).set_alignment(CellAlignment::Right)
}

fn unknown() -> Cell {
    Cell::new("-").set_alignment(CellAlignment::Right)
}

pub fn invoice_table(invoices: &[Invoice]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Number", "Date", "Customer", "Product", "Qty", "Total"]);
    for invoice in invoices {
        table.add_row(vec![
            Cell::new(invoice.id()),
            Cell::new(invoice.invoice_number()),
            Cell::new(invoice.order_date()),
            Cell::new(invoice.customer_name()),
            Cell::new(invoice.product_name()),
            Cell::new(invoice.quantity()).set_alignment(CellAlignment::Right),
            amount(invoice.total()),
        ]);
    }
    table
}

pub fn invoice_details(invoice: &Invoice) -> Table {
    let d = invoice.details();
    let optional = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

    let mut table = Table::new();
    let rows: Vec<(&str, String)> = vec![
        ("ID", invoice.id().to_string()),
        ("Number", d.invoice_number.clone()),
        ("Date", invoice.order_date().to_string()),
        ("Company", d.company_name.clone()),
        ("Page title", d.page_title.clone()),
        ("Watermark", optional(&d.watermark_text)),
        ("Website", optional(&d.website_url)),
        ("Customer", d.customer_name.clone()),
        ("Phone", d.phone1.clone()),
        ("Phone 2", d.phone2.clone()),
        ("Address", d.address.clone()),
        (
            "Governorate",
            invoice.governorate().map(|g| g.to_string()).unwrap_or_else(|| "-".to_string()),
        ),
        ("Product", d.product_name.clone()),
        ("Quantity", invoice.quantity().to_string()),
        ("Unit price", invoice.price().to_display_2dp()),
        (
            "Purchase price",
            invoice
                .purchase_price()
                .map(|p| p.to_display_2dp())
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Shipping", invoice.shipping_cost().to_display_2dp()),
        ("Total", invoice.total().to_display_2dp()),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    table
}

pub fn report_table(report: &SalesReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Invoices"), Cell::new(report.invoice_count).set_alignment(CellAlignment::Right)]);
    table.add_row(vec![Cell::new("Total sales"), amount(report.total_sales)]);
    table.add_row(vec![Cell::new("Purchase cost"), amount(report.total_purchase_cost)]);
    table.add_row(vec![Cell::new("Shipping collected"), amount(report.total_shipping)]);
    table.add_row(vec![
        Cell::new("Net profit").add_attribute(Attribute::Bold),
        amount(report.product_profit).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Gross profit incl. shipping"),
        amount(report.gross_profit_incl_shipping),
    ]);
    table
}

/// Uncosted invoices show `-` rather than a profit that assumes zero cost.
pub fn profit_table(rows: &[ProfitRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Number", "Product", "Qty", "Price", "Purchase", "Unit profit", "Profit"]);
    for row in rows {
        let (purchase, unit, line) = match row.purchase_price {
            Some(p) => (amount(p), amount(row.unit_profit), amount(row.line_profit)),
            None => (unknown(), unknown(), unknown()),
        };
        table.add_row(vec![
            Cell::new(&row.invoice_number),
            Cell::new(&row.product_name),
            Cell::new(row.quantity).set_alignment(CellAlignment::Right),
            amount(row.price),
            purchase,
            unit,
            line,
        ]);
    }
    table
}

pub fn snapshot_line(invoices: &[Invoice]) -> String {
    let report = SalesReport::from_invoices(invoices);
    format!(
        "{} invoices, total sales {}",
        report.invoice_count,
        report.total_sales.to_display_2dp()
    )
}
