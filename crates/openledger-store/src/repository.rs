//! The repository contract.

use async_trait::async_trait;
use serde_json::Value;

use openledger_types::{Doc, LedgerError, LedgerResult};

use crate::RecordFilter;

/// Namespaced key-value store holding JSON documents.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetch a document, `None` when the key is absent.
    async fn get_and_check_exist(&self, doc: Doc, key: &str) -> LedgerResult<Option<Value>>;

    /// Insert a new document. Fails with [`LedgerError::RecordExists`] if
    /// the key is taken.
    async fn create(&self, doc: Doc, key: &str, value: Value) -> LedgerResult<()>;

    /// Replace an existing document. Fails with
    /// [`LedgerError::RecordNotFound`] if the key is absent.
    async fn update(&self, doc: Doc, key: &str, value: Value) -> LedgerResult<()>;

    /// Documents in `doc` matching `filter`, as `(key, document)` pairs.
    async fn query(&self, doc: Doc, filter: &RecordFilter) -> LedgerResult<Vec<(String, Value)>>;

    /// Fetch a document, failing with [`LedgerError::RecordNotFound`] when
    /// the key is absent.
    async fn get(&self, doc: Doc, key: &str) -> LedgerResult<Value> {
        self.get_and_check_exist(doc, key)
            .await?
            .ok_or_else(|| LedgerError::RecordNotFound {
                doc,
                key: key.to_string(),
            })
    }
}
