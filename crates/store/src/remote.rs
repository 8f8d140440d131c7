//! Remote invoice store over a flat document collection.
//!
//! The backend holds one document per invoice, keyed by id, under a single
//! top-level collection. The store keeps the last fetched collection as its
//! snapshot; writes go to the backend first and are applied to the snapshot
//! only once acknowledged.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use salesbook_core::{InvoiceId, Money};
use salesbook_invoicing::{Invoice, InvoiceDraft};

use crate::error::{StoreError, StoreResult};
use crate::feed::{ChangeFeed, Snapshot, Subscription};
use crate::store::{InvoiceStore, MissingRecordPolicy, Placement, StoreConfig, place};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Document collection keyed by invoice id.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Every stored invoice, in ascending key order.
    async fn fetch_all(&self) -> Result<Vec<Invoice>, BackendError>;

    /// Write (create or overwrite) the document at `invoice.id()`.
    async fn put(&self, invoice: &Invoice) -> Result<(), BackendError>;

    /// Remove the document at `id`; removing an absent document succeeds.
    async fn remove(&self, id: &InvoiceId) -> Result<(), BackendError>;

    /// Replace the whole collection.
    async fn replace_all(&self, invoices: &[Invoice]) -> Result<(), BackendError>;
}

#[async_trait]
impl<B> DocumentBackend for Arc<B>
where
    B: DocumentBackend + ?Sized,
{
    async fn fetch_all(&self) -> Result<Vec<Invoice>, BackendError> {
        (**self).fetch_all().await
    }

    async fn put(&self, invoice: &Invoice) -> Result<(), BackendError> {
        (**self).put(invoice).await
    }

    async fn remove(&self, id: &InvoiceId) -> Result<(), BackendError> {
        (**self).remove(id).await
    }

    async fn replace_all(&self, invoices: &[Invoice]) -> Result<(), BackendError> {
        (**self).replace_all(invoices).await
    }
}

/// In-memory document backend for tests/dev.
///
/// Share it behind an `Arc` between several stores to simulate multiple
/// clients of one remote collection.
#[derive(Debug)]
pub struct InMemoryDocumentBackend {
    docs: RwLock<BTreeMap<InvoiceId, Invoice>>,
    available: AtomicBool,
}

impl InMemoryDocumentBackend {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// While unavailable, every call fails with [`BackendError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<(), BackendError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("in-memory backend marked unavailable".into()))
        }
    }
}

impl Default for InMemoryDocumentBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> BackendError {
    BackendError::Unavailable("lock poisoned".into())
}

#[async_trait]
impl DocumentBackend for InMemoryDocumentBackend {
    async fn fetch_all(&self) -> Result<Vec<Invoice>, BackendError> {
        self.ensure_available()?;
        let docs = self.docs.read().map_err(poisoned)?;
        Ok(docs.values().cloned().collect())
    }

    async fn put(&self, invoice: &Invoice) -> Result<(), BackendError> {
        self.ensure_available()?;
        let mut docs = self.docs.write().map_err(poisoned)?;
        docs.insert(invoice.id().clone(), invoice.clone());
        Ok(())
    }

    async fn remove(&self, id: &InvoiceId) -> Result<(), BackendError> {
        self.ensure_available()?;
        let mut docs = self.docs.write().map_err(poisoned)?;
        docs.remove(id);
        Ok(())
    }

    async fn replace_all(&self, invoices: &[Invoice]) -> Result<(), BackendError> {
        self.ensure_available()?;
        let mut docs = self.docs.write().map_err(poisoned)?;
        *docs = invoices
            .iter()
            .map(|inv| (inv.id().clone(), inv.clone()))
            .collect();
        Ok(())
    }
}

struct Inner<B> {
    backend: B,
    feed: ChangeFeed,
    write_lock: Mutex<()>,
    policy: MissingRecordPolicy,
}

/// Invoice store backed by a [`DocumentBackend`].
///
/// Listing is newest first: the backend's ascending key order reversed
/// (generated ids are time-ordered). Changes made by other clients become
/// visible on [`refresh`](Self::refresh), either called directly or from the
/// task started by [`spawn_refresh`](Self::spawn_refresh).
///
/// Remote changes arrive by polling, not by a streaming listener: the
/// backend trait is plain request/response, so the refresh interval bounds
/// how stale a subscriber's snapshot can be. Local writes publish
/// immediately.
pub struct RemoteInvoiceStore<B> {
    inner: Arc<Inner<B>>,
    shutdown: Arc<Notify>,
    stopped: Arc<AtomicBool>,
}

impl<B: DocumentBackend + 'static> RemoteInvoiceStore<B> {
    /// Fetch the initial collection. An unreachable backend yields an empty
    /// collection; the failure is logged.
    pub async fn open(backend: B, config: StoreConfig) -> Self {
        let initial = match backend.fetch_all().await {
            Ok(invoices) => newest_first(invoices),
            Err(err) => {
                tracing::error!(error = %err, "initial fetch of remote invoices failed; starting empty");
                Vec::new()
            }
        };
        tracing::info!(count = initial.len(), "remote invoice store opened");

        Self {
            inner: Arc::new(Inner {
                backend,
                feed: ChangeFeed::new(initial),
                write_lock: Mutex::new(()),
                policy: config.missing_record,
            }),
            shutdown: Arc::new(Notify::new()),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Re-fetch the collection and publish it if it changed.
    ///
    /// Returns whether a new snapshot was published. On failure the last
    /// snapshot is kept.
    pub async fn refresh(&self) -> StoreResult<bool> {
        self.inner.refresh().await
    }

    /// Start a background task that refreshes every `every` until
    /// [`shutdown`](Self::shutdown). Must be called within a tokio runtime.
    pub fn spawn_refresh(&self, every: Duration) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let shutdown = Arc::clone(&self.shutdown);
        let stopped = Arc::clone(&self.stopped);

        tokio::spawn(async move {
            tracing::info!(interval_ms = every.as_millis() as u64, "remote refresh started");

            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                if stopped.load(Ordering::Acquire) {
                    break;
                }
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = inner.refresh().await {
                            tracing::error!(error = %err, "remote refresh failed; keeping last snapshot");
                        }
                    }
                }
            }

            tracing::info!("remote refresh stopped");
        })
    }

    /// Stop every refresh task started by this store.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        self.shutdown.notify_waiters();
    }

    pub fn is_shut_down(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl<B: DocumentBackend> Inner<B> {
    async fn refresh(&self) -> StoreResult<bool> {
        let fetched = self
            .backend
            .fetch_all()
            .await
            .map_err(|e| StoreError::persistence("refresh", e))?;
        let fetched = newest_first(fetched);

        let _guard = self.write_lock.lock().await;
        if *self.feed.current() == *fetched {
            return Ok(false);
        }
        tracing::debug!(count = fetched.len(), "remote collection changed");
        self.feed.publish(fetched);
        Ok(true)
    }

    async fn push(&self, operation: &'static str, invoice: &Invoice) -> StoreResult<()> {
        self.backend.put(invoice).await.map_err(|e| {
            tracing::error!(operation, invoice_id = %invoice.id(), error = %e, "remote write failed");
            StoreError::persistence(operation, e)
        })
    }
}

fn newest_first(mut invoices: Vec<Invoice>) -> Vec<Invoice> {
    invoices.reverse();
    invoices
}

#[async_trait]
impl<B: DocumentBackend + 'static> InvoiceStore for RemoteInvoiceStore<B> {
    async fn create(&self, draft: InvoiceDraft) -> StoreResult<InvoiceId> {
        let invoice = Invoice::issue(InvoiceId::generate(), draft)?;
        let id = invoice.id().clone();
        let inner = &self.inner;

        let _guard = inner.write_lock.lock().await;
        inner.push("create", &invoice).await?;

        let current = inner.feed.current();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(invoice);
        next.extend(current.iter().cloned());
        inner.feed.publish(next);

        tracing::info!(invoice_id = %id, "invoice created");
        Ok(id)
    }

    async fn update(&self, id: &InvoiceId, draft: InvoiceDraft) -> StoreResult<()> {
        draft.validate()?;
        let inner = &self.inner;

        let _guard = inner.write_lock.lock().await;
        let mut next = inner.feed.current().to_vec();
        match place(&next, id, inner.policy)? {
            Placement::Existing(index) => {
                let revised = next[index].revise(draft)?;
                inner.push("update", &revised).await?;
                next[index] = revised;
            }
            Placement::Insert => {
                let invoice = Invoice::issue(id.clone(), draft)?;
                inner.push("update", &invoice).await?;
                next.insert(0, invoice);
            }
            Placement::Skip => {
                tracing::debug!(invoice_id = %id, "update of unknown invoice ignored");
                return Ok(());
            }
        }
        inner.feed.publish(next);

        tracing::info!(invoice_id = %id, "invoice updated");
        Ok(())
    }

    async fn set_purchase_price(&self, id: &InvoiceId, purchase_price: Option<Money>) -> StoreResult<()> {
        let inner = &self.inner;

        let _guard = inner.write_lock.lock().await;
        let mut next = inner.feed.current().to_vec();
        let Some(index) = next.iter().position(|inv| inv.id() == id) else {
            if inner.policy == MissingRecordPolicy::Ignore {
                return Ok(());
            }
            return Err(StoreError::NotFound(id.clone()));
        };
        let revised = next[index].with_purchase_price(purchase_price);
        inner.push("set_purchase_price", &revised).await?;
        next[index] = revised;
        inner.feed.publish(next);

        tracing::info!(invoice_id = %id, "purchase price updated");
        Ok(())
    }

    async fn delete(&self, id: &InvoiceId) -> StoreResult<()> {
        let inner = &self.inner;

        let _guard = inner.write_lock.lock().await;
        inner.backend.remove(id).await.map_err(|e| {
            tracing::error!(invoice_id = %id, error = %e, "remote delete failed");
            StoreError::persistence("delete", e)
        })?;

        let current = inner.feed.current();
        if current.iter().any(|inv| inv.id() == id) {
            inner
                .feed
                .publish(current.iter().filter(|inv| inv.id() != id).cloned().collect());
            tracing::info!(invoice_id = %id, "invoice deleted");
        }
        Ok(())
    }

    async fn replace_all(&self, invoices: Vec<Invoice>) -> StoreResult<()> {
        let inner = &self.inner;

        let _guard = inner.write_lock.lock().await;
        inner
            .backend
            .replace_all(&invoices)
            .await
            .map_err(|e| StoreError::persistence("replace_all", e))?;
        let count = invoices.len();
        inner.feed.publish(invoices);

        tracing::info!(count, "invoice collection replaced");
        Ok(())
    }

    async fn list(&self) -> Snapshot {
        self.inner.feed.current()
    }

    fn subscribe(&self) -> Subscription {
        self.inner.feed.subscribe()
    }
}
