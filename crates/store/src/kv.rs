//! Key/value persistence for the local store and settings.
//!
//! Values are opaque strings (JSON documents or plain text); the layout is a
//! handful of well-known keys, see [`keys`].

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Serialized JSON array of every invoice.
    pub const INVOICES: &str = "salesbook_invoices";
    /// Application display name (plain string).
    pub const APP_NAME: &str = "salesbook_app_name";
    /// Serialized JSON object: governorate name -> shipping cost.
    pub const SHIPPING_RATES: &str = "salesbook_shipping_rates";
}

#[derive(Debug, Error)]
pub enum KeyValueError {
    #[error("i/o error on key {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Minimal string key/value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueError>;
    async fn set(&self, key: &str, value: String) -> Result<(), KeyValueError>;
    async fn remove(&self, key: &str) -> Result<(), KeyValueError>;
}

#[async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KeyValueError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueError> {
        (**self).remove(key).await
    }
}

/// One file per key (`{root}/{key}.json`) under a data directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

fn io_err(key: &str) -> impl FnOnce(io::Error) -> KeyValueError + '_ {
    move |source| KeyValueError::Io {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(key)(e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KeyValueError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(io_err(key))?;

        let target = self.path_for(key);
        let staging = self.root.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&staging, value).await.map_err(io_err(key))?;
        tokio::fs::rename(&staging, &target).await.map_err(io_err(key))?;

        tracing::debug!(key, path = %target.display(), "wrote key");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(key)(e)),
        }
    }
}

/// In-memory key/value store for tests/dev.
///
/// `set_available(false)` makes writes fail, to exercise persistence-error
/// paths.
#[derive(Debug)]
pub struct InMemoryKeyValueStore {
    inner: RwLock<HashMap<String, String>>,
    writable: AtomicBool,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            writable: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.writable.store(available, Ordering::SeqCst);
    }

    fn ensure_writable(&self) -> Result<(), KeyValueError> {
        if self.writable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(KeyValueError::Unavailable("in-memory store marked unavailable".into()))
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueError> {
        let map = self
            .inner
            .read()
            .map_err(|_| KeyValueError::Unavailable("lock poisoned".into()))?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KeyValueError> {
        self.ensure_writable()?;
        let mut map = self
            .inner
            .write()
            .map_err(|_| KeyValueError::Unavailable("lock poisoned".into()))?;
        map.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueError> {
        self.ensure_writable()?;
        let mut map = self
            .inner
            .write()
            .map_err(|_| KeyValueError::Unavailable("lock poisoned".into()))?;
        map.remove(key);
        Ok(())
    }
}
