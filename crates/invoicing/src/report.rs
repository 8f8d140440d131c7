//! Sales / purchase-cost / profit aggregation over a set of invoices.
//!
//! Two profit figures are reported side by side because they answer
//! different questions:
//!
//! - [`SalesReport::product_profit`]: `Σ (price·qty − purchase·qty)`, shipping
//!   excluded from both revenue and cost.
//! - [`SalesReport::gross_profit_incl_shipping`]: `total_sales −
//!   total_purchase_cost`, shipping counted as revenue.
//!
//! They always differ by exactly `total_shipping`.

use serde::Serialize;

use salesbook_core::{InvoiceId, Money};

use crate::invoice::Invoice;
use crate::pricing;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub invoice_count: usize,
    /// `Σ total` (shipping included).
    pub total_sales: Money,
    /// `Σ purchase_price·qty`, unset purchase prices counting as zero.
    pub total_purchase_cost: Money,
    pub total_shipping: Money,
    pub product_profit: Money,
    pub gross_profit_incl_shipping: Money,
}

impl SalesReport {
    pub fn from_invoices<'a, I>(invoices: I) -> Self
    where
        I: IntoIterator<Item = &'a Invoice>,
    {
        let mut report = SalesReport::default();
        for invoice in invoices {
            report.add(invoice);
        }
        report.gross_profit_incl_shipping = report.total_sales - report.total_purchase_cost;
        report
    }

    fn add(&mut self, invoice: &Invoice) {
        self.invoice_count += 1;
        self.total_sales += invoice.total();
        self.total_purchase_cost += pricing::line_cost(invoice.quantity(), invoice.purchase_price());
        self.total_shipping += invoice.shipping_cost();
        self.product_profit += pricing::line_profit(
            invoice.price(),
            invoice.quantity(),
            invoice.purchase_price(),
        );
    }
}

/// One row of the purchase-price / profit table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitRow {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
    pub purchase_price: Option<Money>,
    pub unit_profit: Money,
    pub line_profit: Money,
}

impl ProfitRow {
    pub fn for_invoice(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.id().clone(),
            invoice_number: invoice.invoice_number().to_string(),
            product_name: invoice.product_name().to_string(),
            quantity: invoice.quantity(),
            price: invoice.price(),
            purchase_price: invoice.purchase_price(),
            unit_profit: pricing::unit_profit(invoice.price(), invoice.purchase_price()),
            line_profit: pricing::line_profit(
                invoice.price(),
                invoice.quantity(),
                invoice.purchase_price(),
            ),
        }
    }

    /// Whether a purchase price has been entered; display layers show the
    /// profit as unknown otherwise.
    pub fn is_costed(&self) -> bool {
        self.purchase_price.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceDraft;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn invoice(id: &str, price: i64, qty: u32, purchase: Option<i64>, shipping: i64) -> Invoice {
        let mut d = InvoiceDraft::new(format!("INV-{id}"), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        d.customer_name = "Customer".to_string();
        d.product_name = "Product".to_string();
        d.price = Money::from_units(price);
        d.quantity = qty;
        d.purchase_price = purchase.map(Money::from_units);
        d.shipping_cost = Money::from_units(shipping);
        Invoice::issue(id.parse().unwrap(), d).unwrap()
    }

    #[test]
    fn two_invoice_scenario() {
        let a = invoice("a", 100, 2, Some(60), 20);
        let b = invoice("b", 50, 1, None, 10);
        let report = SalesReport::from_invoices([&a, &b]);

        assert_eq!(report.invoice_count, 2);
        assert_eq!(report.total_sales, Money::from_units(280));
        assert_eq!(report.total_purchase_cost, Money::from_units(120));
        assert_eq!(report.product_profit, Money::from_units(130));
        assert_eq!(report.gross_profit_incl_shipping, Money::from_units(160));
        assert_eq!(report.total_shipping, Money::from_units(30));
    }

    #[test]
    fn empty_collection_reports_zeros() {
        let report = SalesReport::from_invoices(std::iter::empty::<&Invoice>());
        assert_eq!(report, SalesReport::default());
    }

    #[test]
    fn profit_row_for_uncosted_invoice() {
        let row = ProfitRow::for_invoice(&invoice("b", 50, 3, None, 10));
        assert!(!row.is_costed());
        assert_eq!(row.unit_profit, Money::from_units(50));
        assert_eq!(row.line_profit, Money::from_units(150));
    }

    proptest! {
        #[test]
        fn profit_formulas_differ_by_shipping(
            rows in proptest::collection::vec(
                (0i64..10_000, 0u32..50, proptest::option::of(0i64..10_000), 0i64..500),
                0..20,
            )
        ) {
            let invoices: Vec<Invoice> = rows
                .iter()
                .enumerate()
                .map(|(i, (p, q, c, s))| invoice(&format!("i{i}"), *p, *q, *c, *s))
                .collect();
            let report = SalesReport::from_invoices(&invoices);
            prop_assert_eq!(
                report.gross_profit_incl_shipping - report.product_profit,
                report.total_shipping
            );
            prop_assert_eq!(report.invoice_count, invoices.len());
        }
    }
}
