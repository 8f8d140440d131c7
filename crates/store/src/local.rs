//! Local invoice store: the whole collection under one key.

use async_trait::async_trait;
use tokio::sync::Mutex;

use salesbook_core::{InvoiceId, Money};
use salesbook_invoicing::{Invoice, InvoiceDraft};

use crate::backup;
use crate::error::{StoreError, StoreResult};
use crate::feed::{ChangeFeed, Snapshot, Subscription};
use crate::kv::{KeyValueStore, keys};
use crate::store::{InvoiceStore, MissingRecordPolicy, Placement, StoreConfig, place};

/// Invoice store backed by a [`KeyValueStore`].
///
/// Every write serializes the full collection to [`keys::INVOICES`] and only
/// then publishes it. Writes are serialized through an async mutex, so
/// read-modify-write sequences never interleave within one process.
pub struct LocalInvoiceStore<K> {
    kv: K,
    feed: ChangeFeed,
    write_lock: Mutex<()>,
    policy: MissingRecordPolicy,
}

impl<K: KeyValueStore> LocalInvoiceStore<K> {
    /// Load the persisted collection.
    ///
    /// Missing data is an empty collection. Unreadable or corrupt data is
    /// logged and also treated as empty; it is left on disk untouched until
    /// the next successful write.
    pub async fn open(kv: K, config: StoreConfig) -> Self {
        let initial = load_invoices(&kv).await;
        tracing::info!(count = initial.len(), "local invoice store opened");
        Self {
            kv,
            feed: ChangeFeed::new(initial),
            write_lock: Mutex::new(()),
            policy: config.missing_record,
        }
    }

    async fn commit(&self, operation: &'static str, next: Vec<Invoice>) -> StoreResult<()> {
        let payload = backup::encode(&next)?;
        self.kv
            .set(keys::INVOICES, payload)
            .await
            .map_err(|e| {
                tracing::error!(operation, error = %e, "failed to persist invoices");
                StoreError::persistence(operation, e)
            })?;
        self.feed.publish(next);
        Ok(())
    }
}

async fn load_invoices<K: KeyValueStore>(kv: &K) -> Vec<Invoice> {
    let raw = match kv.get(keys::INVOICES).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::error!(error = %err, "failed to read stored invoices; starting empty");
            return Vec::new();
        }
    };

    match backup::decode(&raw) {
        Ok(invoices) => invoices,
        Err(err) => {
            tracing::error!(error = %err, "failed to parse stored invoices; starting empty");
            Vec::new()
        }
    }
}

#[async_trait]
impl<K: KeyValueStore> InvoiceStore for LocalInvoiceStore<K> {
    async fn create(&self, draft: InvoiceDraft) -> StoreResult<InvoiceId> {
        let invoice = Invoice::issue(InvoiceId::generate(), draft)?;
        let id = invoice.id().clone();

        let _guard = self.write_lock.lock().await;
        let current = self.feed.current();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(invoice);
        next.extend(current.iter().cloned());

        self.commit("create", next).await?;
        tracing::info!(invoice_id = %id, "invoice created");
        Ok(id)
    }

    async fn update(&self, id: &InvoiceId, draft: InvoiceDraft) -> StoreResult<()> {
        draft.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut next = self.feed.current().to_vec();
        match place(&next, id, self.policy)? {
            Placement::Existing(index) => {
                next[index] = next[index].revise(draft)?;
            }
            Placement::Insert => next.insert(0, Invoice::issue(id.clone(), draft)?),
            Placement::Skip => {
                tracing::debug!(invoice_id = %id, "update of unknown invoice ignored");
                return Ok(());
            }
        }

        self.commit("update", next).await?;
        tracing::info!(invoice_id = %id, "invoice updated");
        Ok(())
    }

    async fn set_purchase_price(&self, id: &InvoiceId, purchase_price: Option<Money>) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.feed.current().to_vec();
        let Some(index) = next.iter().position(|inv| inv.id() == id) else {
            if self.policy == MissingRecordPolicy::Ignore {
                return Ok(());
            }
            return Err(StoreError::NotFound(id.clone()));
        };
        next[index] = next[index].with_purchase_price(purchase_price);

        self.commit("set_purchase_price", next).await?;
        tracing::info!(invoice_id = %id, "purchase price updated");
        Ok(())
    }

    async fn delete(&self, id: &InvoiceId) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let current = self.feed.current();
        if !current.iter().any(|inv| inv.id() == id) {
            tracing::debug!(invoice_id = %id, "delete of unknown invoice is a no-op");
            return Ok(());
        }
        let next = current.iter().filter(|inv| inv.id() != id).cloned().collect();

        self.commit("delete", next).await?;
        tracing::info!(invoice_id = %id, "invoice deleted");
        Ok(())
    }

    async fn replace_all(&self, invoices: Vec<Invoice>) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let count = invoices.len();
        self.commit("replace_all", invoices).await?;
        tracing::info!(count, "invoice collection replaced");
        Ok(())
    }

    async fn list(&self) -> Snapshot {
        self.feed.current()
    }

    fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }
}
