//! In-batch balance overlay.
//!
//! The cache maps `(domain, wallet, token)` to a working copy of the
//! balance record. It is hydrated lazily from the store on first touch,
//! mutated in memory for the rest of the batch, and written back once by
//! [`BalanceCache::flush`].
//!
//! ```text
//! first touch   add_amount  -> load record, or synthesize zero (is_new)
//!               sub_amount  -> load record, BalanceNotFound if absent
//! flush         is_new      -> create
//!               otherwise   -> update
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use openledger_store::{LedgerStore, RecordStoreExt, keys};
use openledger_types::{
    Amount, BalanceDomain, BalanceRecord, LedgerError, LedgerResult, TokenId, WalletId,
};

/// Cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BalanceKey {
    pub domain: BalanceDomain,
    pub wallet: WalletId,
    pub token: TokenId,
}

impl BalanceKey {
    #[must_use]
    pub fn new(domain: BalanceDomain, wallet: &WalletId, token: &TokenId) -> Self {
        Self {
            domain,
            wallet: wallet.clone(),
            token: token.clone(),
        }
    }
}

/// A cached balance and whether it must be created (vs updated) at flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub record: BalanceRecord,
    pub is_new: bool,
}

impl CacheEntry {
    /// Write this entry to the store: create when new, update otherwise.
    pub async fn write<S>(&self, store: &S) -> LedgerResult<()>
    where
        S: LedgerStore + ?Sized,
    {
        if self.is_new {
            store.insert(&self.record).await
        } else {
            store.save(&self.record).await
        }
    }
}

/// Overlay of balances touched by one batch.
pub struct BalanceCache<S: ?Sized> {
    store: Arc<S>,
    timestamp: DateTime<Utc>,
    entries: BTreeMap<BalanceKey, CacheEntry>,
}

impl<S> BalanceCache<S>
where
    S: LedgerStore + ?Sized,
{
    /// Empty cache; `timestamp` stamps every record written at flush.
    pub fn new(store: Arc<S>, timestamp: DateTime<Utc>) -> Self {
        Self {
            store,
            timestamp,
            entries: BTreeMap::new(),
        }
    }

    /// Credit `amount`, creating a zero balance on first credit. Returns the
    /// new balance.
    pub async fn add_amount(
        &mut self,
        domain: BalanceDomain,
        wallet: &WalletId,
        token: &TokenId,
        amount: Amount,
    ) -> LedgerResult<Amount> {
        let key = BalanceKey::new(domain, wallet, token);
        if !self.entries.contains_key(&key) {
            let entry = match self.fetch(&key).await? {
                Some(record) => CacheEntry {
                    record,
                    is_new: false,
                },
                None => CacheEntry {
                    record: BalanceRecord::zero(
                        domain,
                        wallet.clone(),
                        token.clone(),
                        self.timestamp,
                    ),
                    is_new: true,
                },
            };
            self.entries.insert(key.clone(), entry);
        }
        let Some(entry) = self.entries.get_mut(&key) else {
            return Err(LedgerError::Internal("balance cache entry vanished".into()));
        };
        entry.record.balances = entry.record.balances.try_add(amount)?;
        debug!(%domain, %wallet, %token, %amount, balance = %entry.record.balances, "cache credit");
        Ok(entry.record.balances)
    }

    /// Debit `amount`. The balance must already exist (in the cache or the
    /// store) and be at least `amount`. Returns the new balance.
    pub async fn sub_amount(
        &mut self,
        domain: BalanceDomain,
        wallet: &WalletId,
        token: &TokenId,
        amount: Amount,
    ) -> LedgerResult<Amount> {
        let key = BalanceKey::new(domain, wallet, token);
        if !self.entries.contains_key(&key) {
            let record = self
                .fetch(&key)
                .await?
                .ok_or_else(|| LedgerError::BalanceNotFound {
                    domain,
                    wallet: wallet.clone(),
                    token: token.clone(),
                })?;
            self.entries.insert(
                key.clone(),
                CacheEntry {
                    record,
                    is_new: false,
                },
            );
        }
        let Some(entry) = self.entries.get_mut(&key) else {
            return Err(LedgerError::Internal("balance cache entry vanished".into()));
        };
        let available = entry.record.balances;
        entry.record.balances =
            available
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    wallet: wallet.clone(),
                    token: token.clone(),
                    needed: amount,
                    available,
                })?;
        debug!(%domain, %wallet, %token, %amount, balance = %entry.record.balances, "cache debit");
        Ok(entry.record.balances)
    }

    /// Cached balance, `None` if the key was never touched.
    #[must_use]
    pub fn balance(&self, key: &BalanceKey) -> Option<Amount> {
        self.entries.get(key).map(|e| e.record.balances)
    }

    #[must_use]
    pub fn entry(&self, key: &BalanceKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop a synthesized entry whose balance went back to zero, so a
    /// rolled-back first credit leaves no record behind.
    pub fn forget_if_unused(&mut self, key: &BalanceKey) {
        if self
            .entries
            .get(key)
            .is_some_and(|e| e.is_new && e.record.balances.is_zero())
        {
            self.entries.remove(key);
        }
    }

    /// Write every touched entry back, one store call each. Returns the
    /// number of records written.
    pub async fn flush(&mut self) -> LedgerResult<usize> {
        let mut written = 0;
        for entry in self.entries.values_mut() {
            entry.record.updated_at = self.timestamp;
            entry.write(self.store.as_ref()).await?;
            entry.is_new = false;
            written += 1;
        }
        debug!(written, "balance cache flushed");
        Ok(written)
    }

    /// Hand the entries over for writing elsewhere, stamped with the batch
    /// timestamp.
    #[must_use]
    pub fn into_entries(self) -> Vec<CacheEntry> {
        let timestamp = self.timestamp;
        self.entries
            .into_values()
            .map(|mut entry| {
                entry.record.updated_at = timestamp;
                entry
            })
            .collect()
    }

    async fn fetch(&self, key: &BalanceKey) -> LedgerResult<Option<BalanceRecord>> {
        let doc = key.domain.doc();
        let store_key = keys::balance(&key.wallet, &key.token);
        self.store.find(doc, &store_key).await
    }
}
