//! Store error model.

use thiserror::Error;

use salesbook_core::{DomainError, InvoiceId};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected by domain rules (e.g. required field missing). Never persisted.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// `update` on an id that is not in the collection.
    #[error("invoice not found: {0}")]
    NotFound(InvoiceId),

    /// The backend refused or failed the write; in-memory state is unchanged.
    #[error("{operation} failed: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn persistence(operation: &'static str, err: impl core::fmt::Display) -> Self {
        Self::Persistence {
            operation,
            message: err.to_string(),
        }
    }

    /// Backend failures are worth a user-initiated retry; everything else
    /// needs the input changed first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}
