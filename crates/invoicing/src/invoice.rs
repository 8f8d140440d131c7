use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use salesbook_core::{DomainError, DomainResult, InvoiceId, Money};

use crate::pricing;
use crate::shipping::{Governorate, ShippingRates, resolve_shipping};

/// Default user-visible number for an invoice submitted at `now`:
/// `INV-` followed by the last six digits of the epoch milliseconds.
pub fn default_invoice_number(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    format!("INV-{millis:06}")
}

/// Editable invoice form data: every field except `id` and `total`.
///
/// Exactly one line item per invoice (`product_name` × `quantity` at
/// `price`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub invoice_number: String,
    #[serde(default)]
    pub page_title: String,
    #[serde(default)]
    pub company_name: String,
    /// Embedded image (data URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,

    pub customer_name: String,
    #[serde(default)]
    pub phone1: String,
    #[serde(default)]
    pub phone2: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governorate: Option<Governorate>,

    pub order_date: NaiveDate,

    pub product_name: String,
    #[serde(deserialize_with = "quantity_from_number_or_text")]
    pub quantity: u32,
    pub price: Money,
    /// Unit cost. `None` means "not entered yet", which is not the same as zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    #[serde(default)]
    pub shipping_cost: Money,
}

impl InvoiceDraft {
    pub fn new(invoice_number: impl Into<String>, order_date: NaiveDate) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            page_title: String::new(),
            company_name: String::new(),
            company_logo: None,
            watermark_text: None,
            website_url: None,
            customer_name: String::new(),
            phone1: String::new(),
            phone2: String::new(),
            address: String::new(),
            governorate: None,
            order_date,
            product_name: String::new(),
            quantity: 1,
            price: Money::ZERO,
            purchase_price: None,
            shipping_cost: Money::ZERO,
        }
    }

    /// Blank form for an invoice submitted at `now`.
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self::new(default_invoice_number(now), now.date_naive())
    }

    /// Required fields: customer name and product name.
    pub fn validate(&self) -> DomainResult<()> {
        if self.customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer name is required"));
        }
        if self.product_name.trim().is_empty() {
            return Err(DomainError::validation("product name is required"));
        }
        Ok(())
    }

    /// Change the region, pushing the table's rate into `shipping_cost` when
    /// there is one. Clearing the region leaves the cost alone.
    pub fn set_governorate(&mut self, governorate: Option<Governorate>, rates: &ShippingRates) {
        self.governorate = governorate;
        if let Some(governorate) = governorate {
            self.shipping_cost = resolve_shipping(governorate, rates, self.shipping_cost);
        }
    }

    /// Manual shipping edit; kept until the governorate changes again.
    pub fn set_shipping_cost(&mut self, cost: Money) {
        self.shipping_cost = cost;
    }

    /// Live total for the form (what the invoice will store).
    pub fn total(&self) -> DomainResult<Money> {
        pricing::total(self.price, self.quantity, self.shipping_cost)
    }

    pub fn line_revenue(&self) -> Money {
        pricing::line_revenue(self.price, self.quantity)
    }
}

/// A persisted sales invoice.
///
/// `total` is not settable: every constructor recomputes it from price,
/// quantity and shipping, so a value of this type can never carry a stale
/// total. Deserialization goes through the same path, so a stored record
/// whose total is out of range fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredInvoice")]
pub struct Invoice {
    id: InvoiceId,
    #[serde(flatten)]
    details: InvoiceDraft,
    total: Money,
}

/// Wire shape accepted on input; `total` is optional and only checked.
#[derive(Deserialize)]
struct StoredInvoice {
    id: InvoiceId,
    #[serde(flatten)]
    details: InvoiceDraft,
    #[serde(default)]
    total: Option<Money>,
}

impl TryFrom<StoredInvoice> for Invoice {
    type Error = DomainError;

    fn try_from(stored: StoredInvoice) -> DomainResult<Self> {
        let invoice = Invoice::compute(stored.id, stored.details)?;
        if let Some(claimed) = stored.total {
            if claimed != invoice.total {
                tracing::warn!(
                    invoice_id = %invoice.id,
                    stored_total = %claimed,
                    computed_total = %invoice.total,
                    "stored invoice total was stale; recomputed"
                );
            }
        }
        Ok(invoice)
    }
}

impl Invoice {
    fn compute(id: InvoiceId, details: InvoiceDraft) -> DomainResult<Self> {
        let total = details.total()?;
        Ok(Self { id, details, total })
    }

    /// Create an invoice from a validated draft.
    pub fn issue(id: InvoiceId, draft: InvoiceDraft) -> DomainResult<Self> {
        draft.validate()?;
        Self::compute(id, draft)
    }

    /// Replace every editable field, keeping the identity.
    pub fn revise(&self, draft: InvoiceDraft) -> DomainResult<Self> {
        Self::issue(self.id.clone(), draft)
    }

    /// Copy with only the purchase price changed.
    pub fn with_purchase_price(&self, purchase_price: Option<Money>) -> Self {
        let mut next = self.clone();
        next.details.purchase_price = purchase_price;
        next
    }

    pub fn id(&self) -> &InvoiceId {
        &self.id
    }

    pub fn details(&self) -> &InvoiceDraft {
        &self.details
    }

    /// Editable copy of the fields, e.g. to pre-fill an edit form.
    pub fn to_draft(&self) -> InvoiceDraft {
        self.details.clone()
    }

    pub fn invoice_number(&self) -> &str {
        &self.details.invoice_number
    }

    pub fn customer_name(&self) -> &str {
        &self.details.customer_name
    }

    pub fn product_name(&self) -> &str {
        &self.details.product_name
    }

    pub fn order_date(&self) -> NaiveDate {
        self.details.order_date
    }

    pub fn governorate(&self) -> Option<Governorate> {
        self.details.governorate
    }

    pub fn quantity(&self) -> u32 {
        self.details.quantity
    }

    pub fn price(&self) -> Money {
        self.details.price
    }

    pub fn purchase_price(&self) -> Option<Money> {
        self.details.purchase_price
    }

    pub fn shipping_cost(&self) -> Money {
        self.details.shipping_cost
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn line_revenue(&self) -> Money {
        self.details.line_revenue()
    }

    /// Case-insensitive substring match on customer name or invoice number.
    /// An empty term matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.details.customer_name.to_lowercase().contains(&term)
            || self.details.invoice_number.to_lowercase().contains(&term)
    }
}

fn quantity_from_number_or_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid quantity {s:?}"))),
    }
}
