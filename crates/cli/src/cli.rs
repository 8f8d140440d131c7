//! Command-line surface.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use salesbook_core::{InvoiceId, Money};
use salesbook_export::DocumentFormat;
use salesbook_invoicing::{Governorate, InvoiceDraft, ShippingRates};
use salesbook_observability::LogFormat;
use salesbook_store::MissingRecordPolicy;

#[derive(Debug, Parser)]
#[command(name = "salesbook", version, about = "Sales invoices: record, report, export")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Files under the data directory.
    Local,
    /// Remote document store over HTTP.
    Remote,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Directory holding invoices and settings.
    #[arg(long, env = "SALESBOOK_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, env = "SALESBOOK_BACKEND", value_enum, default_value_t = BackendKind::Local, global = true)]
    pub backend: BackendKind,

    /// Base URL of the remote document store.
    #[arg(long, env = "SALESBOOK_REMOTE_URL", global = true)]
    pub remote_url: Option<String>,

    /// Token sent as the `auth` query parameter.
    #[arg(long, env = "SALESBOOK_REMOTE_AUTH", hide_env_values = true, global = true)]
    pub remote_auth: Option<String>,

    /// What editing an unknown invoice does: reject, ignore or upsert.
    #[arg(long, env = "SALESBOOK_MISSING_RECORD", default_value = "reject", global = true)]
    pub missing_record: MissingRecordPolicy,

    /// Seconds between remote refreshes while watching.
    #[arg(long, env = "SALESBOOK_REFRESH_SECS", default_value_t = 5, global = true)]
    pub refresh_secs: u64,

    #[arg(long, env = "SALESBOOK_LOG_FORMAT", default_value = "json", global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an invoice.
    New(InvoiceFields),

    /// Edit an invoice; omitted fields keep their current value. An unknown
    /// id is handled per --missing-record.
    Edit {
        id: InvoiceId,
        #[command(flatten)]
        fields: InvoiceFields,
    },

    /// Set or clear the unit purchase price of an invoice.
    SetPurchasePrice {
        id: InvoiceId,
        #[arg(required_unless_present = "clear")]
        amount: Option<Money>,
        #[arg(long, conflicts_with = "amount")]
        clear: bool,
    },

    Delete {
        id: InvoiceId,
    },

    /// List invoices, newest first.
    List {
        /// Case-insensitive match on customer name or invoice number.
        #[arg(long, short)]
        search: Option<String>,
    },

    Show {
        id: InvoiceId,
    },

    /// Sales, cost and profit totals plus the per-invoice profit table.
    Report,

    /// Write one invoice as a print view, Word document, workbook or PDF.
    Export {
        id: InvoiceId,
        #[arg(long, short, default_value = "print")]
        format: DocumentFormat,
        /// Output directory.
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
    },

    #[command(subcommand)]
    Settings(SettingsCommand),

    #[command(subcommand)]
    Backup(BackupCommand),

    /// Print a summary line every time the collection changes.
    Watch,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Show,

    /// Set the display name used as the default company name.
    AppName { name: String },

    /// Set or clear the shipping rate of a governorate.
    Rate {
        governorate: Governorate,
        #[arg(required_unless_present = "clear")]
        amount: Option<Money>,
        #[arg(long, conflicts_with = "amount")]
        clear: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write every invoice as a JSON array (stdout without `--out`).
    Export {
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Replace every invoice with the contents of a backup file.
    Import {
        file: PathBuf,
        /// Confirm that the current collection will be overwritten.
        #[arg(long)]
        yes: bool,
    },
}

/// Editable invoice fields. All optional so `edit` can patch.
#[derive(Debug, Clone, Default, Args)]
pub struct InvoiceFields {
    #[arg(long)]
    pub number: Option<String>,
    /// Order date, `YYYY-MM-DD`.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub page_title: Option<String>,
    /// Logo image as a data URI.
    #[arg(long)]
    pub logo: Option<String>,
    #[arg(long)]
    pub watermark: Option<String>,
    /// Encoded in the QR code of printed documents.
    #[arg(long)]
    pub website: Option<String>,

    #[arg(long)]
    pub customer: Option<String>,
    #[arg(long)]
    pub phone1: Option<String>,
    #[arg(long)]
    pub phone2: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    /// Also fills the shipping cost from the rate table when it has an entry.
    #[arg(long, conflicts_with = "no_governorate")]
    pub governorate: Option<Governorate>,
    #[arg(long)]
    pub no_governorate: bool,

    #[arg(long)]
    pub product: Option<String>,
    #[arg(long)]
    pub quantity: Option<u32>,
    #[arg(long)]
    pub price: Option<Money>,
    #[arg(long)]
    pub purchase_price: Option<Money>,
    /// Manual shipping cost; wins over the governorate rate.
    #[arg(long)]
    pub shipping: Option<Money>,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl InvoiceFields {
    /// Apply the given fields to `draft`. Region first, so an explicit
    /// `--shipping` overrides the table rate.
    pub fn apply(&self, draft: &mut InvoiceDraft, rates: &ShippingRates) {
        if let Some(v) = &self.number {
            draft.invoice_number = v.clone();
        }
        if let Some(v) = self.date {
            draft.order_date = v;
        }
        if let Some(v) = &self.company {
            draft.company_name = v.clone();
        }
        if let Some(v) = &self.page_title {
            draft.page_title = v.clone();
        }
        if let Some(v) = &self.logo {
            draft.company_logo = optional(v);
        }
        if let Some(v) = &self.watermark {
            draft.watermark_text = optional(v);
        }
        if let Some(v) = &self.website {
            draft.website_url = optional(v);
        }
        if let Some(v) = &self.customer {
            draft.customer_name = v.clone();
        }
        if let Some(v) = &self.phone1 {
            draft.phone1 = v.clone();
        }
        if let Some(v) = &self.phone2 {
            draft.phone2 = v.clone();
        }
        if let Some(v) = &self.address {
            draft.address = v.clone();
        }
        if let Some(v) = &self.product {
            draft.product_name = v.clone();
        }
        if let Some(v) = self.quantity {
            draft.quantity = v;
        }
        if let Some(v) = self.price {
            draft.price = v;
        }
        if let Some(v) = self.purchase_price {
            draft.purchase_price = Some(v);
        }

        if self.no_governorate {
            draft.set_governorate(None, rates);
        } else if let Some(g) = self.governorate {
            draft.set_governorate(Some(g), rates);
        }
        if let Some(v) = self.shipping {
            draft.set_shipping_cost(v);
        }
    }
}
