//! `salesbook-store` — invoice persistence and change notification.
//!
//! **Responsibility:** the [`InvoiceStore`] contract and its two variants:
//!
//! - [`LocalInvoiceStore`]: the whole collection serialized under one
//!   well-known key of a [`KeyValueStore`] (a data directory, or memory).
//! - [`RemoteInvoiceStore`]: a flat document collection keyed by invoice id
//!   behind a [`DocumentBackend`] (HTTP or memory), refreshed periodically.
//!
//! Both publish full-collection snapshots through a [`ChangeFeed`]. The
//! crate also owns application settings persistence and the JSON backup
//! format.

pub mod backup;
pub mod error;
pub mod feed;
#[cfg(feature = "http")]
pub mod http;
pub mod kv;
pub mod local;
pub mod remote;
pub mod settings;
pub mod store;

pub use backup::BackupError;
pub use error::{StoreError, StoreResult};
pub use feed::{ChangeFeed, Snapshot, Subscription, SubscriptionHandle};
#[cfg(feature = "http")]
pub use http::HttpDocumentBackend;
pub use kv::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueError, KeyValueStore};
pub use local::LocalInvoiceStore;
pub use remote::{BackendError, DocumentBackend, InMemoryDocumentBackend, RemoteInvoiceStore};
pub use settings::{AppSettings, SettingsStore};
pub use store::{InvoiceStore, MissingRecordPolicy, StoreConfig};
