//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of an invoice.
///
/// Opaque text: freshly generated ids are UUIDv7 strings (which sort in
/// creation order), but ids imported from older backups may be other
/// strings, so the inner value is not required to parse as a UUID.
///
/// Ids become document keys and URL path segments, so only ASCII letters,
/// digits, `-` and `_` are allowed. Deserialization applies the same checks
/// as `FromStr`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceId(String);

impl InvoiceId {
    /// Generate a fresh, globally unique identifier.
    ///
    /// Prefer passing IDs explicitly in tests for determinism.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<InvoiceId> for String {
    fn from(value: InvoiceId) -> Self {
        value.0
    }
}

impl FromStr for InvoiceId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("InvoiceId: empty"));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(DomainError::invalid_id(format!(
                "InvoiceId: illegal character in {trimmed:?}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for InvoiceId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
