//! REST document backend (Realtime-Database style JSON tree).
//!
//! Layout: `{base}/invoices.json` is an object of `{id: invoice}`; each
//! invoice lives at `{base}/invoices/{id}.json`. An optional token is sent as
//! the `auth` query parameter.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use salesbook_core::InvoiceId;
use salesbook_invoicing::Invoice;

use crate::remote::{BackendError, DocumentBackend};

const COLLECTION: &str = "invoices";

#[derive(Debug, Clone)]
pub struct HttpDocumentBackend {
    client: Client,
    base_url: String,
    auth: Option<String>,
}

impl HttpDocumentBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth: None,
        }
    }

    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(token.into());
        self
    }

    /// Use a preconfigured client (timeouts, proxies).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/{COLLECTION}.json", self.base_url)
    }

    fn document_url(&self, id: &InvoiceId) -> String {
        format!("{}/{COLLECTION}/{id}.json", self.base_url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(token) => req.query(&[("auth", token.as_str())]),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, BackendError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }
        Ok(resp)
    }
}

#[async_trait]
impl DocumentBackend for HttpDocumentBackend {
    async fn fetch_all(&self) -> Result<Vec<Invoice>, BackendError> {
        let resp = self.send(self.client.get(self.collection_url())).await?;
        let body = resp.bytes().await.map_err(|e| BackendError::Network(e.to_string()))?;
        parse_collection(&body)
    }

    async fn put(&self, invoice: &Invoice) -> Result<(), BackendError> {
        let req = self.client.put(self.document_url(invoice.id())).json(invoice);
        self.send(req).await?;
        tracing::debug!(invoice_id = %invoice.id(), "document written");
        Ok(())
    }

    async fn remove(&self, id: &InvoiceId) -> Result<(), BackendError> {
        self.send(self.client.delete(self.document_url(id))).await?;
        tracing::debug!(invoice_id = %id, "document removed");
        Ok(())
    }

    async fn replace_all(&self, invoices: &[Invoice]) -> Result<(), BackendError> {
        let body = collection_body(invoices);
        self.send(self.client.put(self.collection_url()).json(&body)).await?;
        tracing::debug!(count = invoices.len(), "collection replaced");
        Ok(())
    }
}

/// Body of `GET {base}/invoices.json`: `null` for an empty collection,
/// otherwise an object of `{id: invoice}`. Malformed documents are skipped.
fn parse_collection(body: &[u8]) -> Result<Vec<Invoice>, BackendError> {
    let docs: Option<BTreeMap<String, Value>> =
        serde_json::from_slice(body).map_err(|e| BackendError::Parse(e.to_string()))?;

    let mut invoices = Vec::new();
    for (key, doc) in docs.unwrap_or_default() {
        match serde_json::from_value::<Invoice>(doc) {
            Ok(invoice) => invoices.push(invoice),
            Err(err) => {
                tracing::error!(key = %key, error = %err, "skipping malformed remote invoice document");
            }
        }
    }
    Ok(invoices)
}

fn collection_body(invoices: &[Invoice]) -> BTreeMap<&str, &Invoice> {
    invoices.iter().map(|inv| (inv.id().as_str(), inv)).collect()
}
