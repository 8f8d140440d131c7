//! The invoice store contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use salesbook_core::{InvoiceId, Money};
use salesbook_invoicing::{Invoice, InvoiceDraft};

use crate::error::StoreResult;
use crate::feed::{Snapshot, Subscription, SubscriptionHandle};

/// What `update` does when the id is not in the collection.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRecordPolicy {
    /// Fail with `StoreError::NotFound`.
    #[default]
    Reject,
    /// Succeed without changing anything.
    Ignore,
    /// Key-based overwrite: the record is created under the given id.
    Upsert,
}

impl core::str::FromStr for MissingRecordPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "ignore" => Ok(Self::Ignore),
            "upsert" => Ok(Self::Upsert),
            other => Err(format!("unknown missing-record policy {other:?} (reject, ignore, upsert)")),
        }
    }
}

/// Construction-time store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub missing_record: MissingRecordPolicy,
}

impl StoreConfig {
    pub fn with_missing_record(mut self, policy: MissingRecordPolicy) -> Self {
        self.missing_record = policy;
        self
    }
}

/// CRUD + live listing over a persistence backend.
///
/// Writes are acknowledged by the backend before any subscriber sees them;
/// a failed write leaves the published collection untouched. Reads never
/// fail: an unreadable backend shows up as an empty (or last known)
/// collection, and the failure is logged.
///
/// Records are last-write-wins; there is no version check.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Validate, assign a fresh id, compute the total, persist, notify.
    async fn create(&self, draft: InvoiceDraft) -> StoreResult<InvoiceId>;

    /// Replace every editable field of `id`, keeping the id.
    async fn update(&self, id: &InvoiceId, draft: InvoiceDraft) -> StoreResult<()>;

    /// Change only the purchase price of `id`.
    async fn set_purchase_price(&self, id: &InvoiceId, purchase_price: Option<Money>) -> StoreResult<()>;

    /// Remove `id`. Removing an absent id is a successful no-op.
    async fn delete(&self, id: &InvoiceId) -> StoreResult<()>;

    /// Replace the whole collection (backup import).
    async fn replace_all(&self, invoices: Vec<Invoice>) -> StoreResult<()>;

    /// Current collection, newest first.
    async fn list(&self) -> Snapshot;

    fn subscribe(&self) -> Subscription;

    async fn get(&self, id: &InvoiceId) -> Option<Invoice> {
        self.list().await.iter().find(|inv| inv.id() == id).cloned()
    }

    /// Case-insensitive match on customer name or invoice number.
    async fn search(&self, term: &str) -> Vec<Invoice> {
        self.list()
            .await
            .iter()
            .filter(|inv| inv.matches_search(term))
            .cloned()
            .collect()
    }

    /// Run `callback` with the current collection and again after every
    /// change, until the returned handle is unsubscribed or dropped.
    fn subscribe_with(&self, callback: Box<dyn FnMut(Snapshot) + Send>) -> SubscriptionHandle {
        SubscriptionHandle::spawn(self.subscribe(), callback)
    }
}

/// Where a record sits in a newest-first collection, and what to do about it.
pub(crate) enum Placement {
    Existing(usize),
    Insert,
    Skip,
}

pub(crate) fn place(
    invoices: &[Invoice],
    id: &InvoiceId,
    policy: MissingRecordPolicy,
) -> StoreResult<Placement> {
    match invoices.iter().position(|inv| inv.id() == id) {
        Some(index) => Ok(Placement::Existing(index)),
        None => match policy {
            MissingRecordPolicy::Reject => Err(crate::StoreError::NotFound(id.clone())),
            MissingRecordPolicy::Ignore => Ok(Placement::Skip),
            MissingRecordPolicy::Upsert => Ok(Placement::Insert),
        },
    }
}
