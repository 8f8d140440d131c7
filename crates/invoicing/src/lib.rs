//! Invoicing domain module.
//!
//! Business rules for single-line sales invoices, implemented purely as
//! deterministic domain logic (no IO, no storage, no rendering):
//!
//! - [`invoice`]: the Invoice record, its editable draft and validation
//! - [`pricing`]: the derived-value engine (totals and profit)
//! - [`shipping`]: governorates and the shipping rate table
//! - [`report`]: sales / cost / profit aggregation across invoices

pub mod invoice;
pub mod pricing;
pub mod report;
pub mod shipping;

pub use invoice::{Invoice, InvoiceDraft, default_invoice_number};
pub use report::{ProfitRow, SalesReport};
pub use shipping::{Governorate, ShippingRates, resolve_shipping};
