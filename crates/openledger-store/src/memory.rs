//! In-memory [`LedgerStore`].
//!
//! Ordered by `(namespace, key)`. Besides plain storage it can inject write
//! failures per namespace, slow writes down, and report how many writes it
//! accepted and how many ran at once.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use openledger_types::{Doc, LedgerError, LedgerResult};

use crate::{LedgerStore, RecordFilter};

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<(Doc, String), Value>>,
    failing: RwLock<HashSet<Doc>>,
    slow: RwLock<HashMap<Doc, Duration>>,
    writes: AtomicU64,
    write_delay_ms: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent create/update in `doc` fail with a
    /// persistence error.
    pub async fn fail_writes(&self, doc: Doc) {
        self.failing.write().await.insert(doc);
    }

    pub async fn heal_writes(&self, doc: Doc) {
        self.failing.write().await.remove(&doc);
    }

    /// Sleep this long inside every write.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Sleep `delay` inside writes to `doc` only. Overrides the store-wide
    /// delay for that namespace.
    pub async fn delay_writes(&self, doc: Doc, delay: Duration) {
        self.slow.write().await.insert(doc, delay);
    }

    /// Successful creates and updates since construction.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Highest number of writes observed running at the same time.
    #[must_use]
    pub fn peak_concurrent_writes(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Number of documents in `doc`.
    pub async fn count(&self, doc: Doc) -> usize {
        self.docs
            .read()
            .await
            .keys()
            .filter(|(d, _)| *d == doc)
            .count()
    }

    async fn write(&self, doc: Doc, key: &str, value: Value, must_exist: bool) -> LedgerResult<()> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let result = self.write_inner(doc, key, value, must_exist).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn write_inner(
        &self,
        doc: Doc,
        key: &str,
        value: Value,
        must_exist: bool,
    ) -> LedgerResult<()> {
        let per_doc = self.slow.read().await.get(&doc).copied();
        let delay = per_doc
            .unwrap_or_else(|| Duration::from_millis(self.write_delay_ms.load(Ordering::SeqCst)));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.read().await.contains(&doc) {
            warn!(%doc, key, "injected write failure");
            return Err(LedgerError::Persistence {
                doc,
                key: key.to_string(),
                reason: "injected write failure".into(),
            });
        }

        let mut docs = self.docs.write().await;
        let slot = (doc, key.to_string());
        match (docs.contains_key(&slot), must_exist) {
            (true, false) => {
                return Err(LedgerError::RecordExists {
                    doc,
                    key: key.to_string(),
                });
            }
            (false, true) => {
                return Err(LedgerError::RecordNotFound {
                    doc,
                    key: key.to_string(),
                });
            }
            _ => {}
        }
        docs.insert(slot, value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(%doc, key, update = must_exist, "stored document");
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_and_check_exist(&self, doc: Doc, key: &str) -> LedgerResult<Option<Value>> {
        let docs = self.docs.read().await;
        Ok(docs.get(&(doc, key.to_string())).cloned())
    }

    async fn create(&self, doc: Doc, key: &str, value: Value) -> LedgerResult<()> {
        self.write(doc, key, value, false).await
    }

    async fn update(&self, doc: Doc, key: &str, value: Value) -> LedgerResult<()> {
        self.write(doc, key, value, true).await
    }

    async fn query(&self, doc: Doc, filter: &RecordFilter) -> LedgerResult<Vec<(String, Value)>> {
        let docs = self.docs.read().await;
        let rows = docs
            .range((doc, String::new())..)
            .take_while(|((d, _), _)| *d == doc)
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect();
        Ok(filter.apply(rows))
    }
}
