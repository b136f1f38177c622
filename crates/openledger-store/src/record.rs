//! Typed record access.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use openledger_types::{
    Asset, BalanceRecord, Campaign, Doc, Enrollment, InvestorBook, LedgerError, LedgerResult,
    PurchaseCacheRecord, TokenType, TransactionRecord, TxCacheRecord, UtxoRecord,
};

use crate::{LedgerStore, RecordFilter, keys};

/// A ledger record: knows its namespace and composite key.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    fn doc(&self) -> Doc;
    fn key(&self) -> String;
}

impl Record for TransactionRecord {
    fn doc(&self) -> Doc {
        Doc::Transactions
    }
    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Record for BalanceRecord {
    fn doc(&self) -> Doc {
        self.domain.doc()
    }
    fn key(&self) -> String {
        keys::balance(&self.wallet_id, &self.token_id)
    }
}

impl Record for TokenType {
    fn doc(&self) -> Doc {
        Doc::Tokens
    }
    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Record for UtxoRecord {
    fn doc(&self) -> Doc {
        Doc::Utxos
    }
    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Record for Enrollment {
    fn doc(&self) -> Doc {
        Doc::Enrollments
    }
    fn key(&self) -> String {
        self.token_id.to_string()
    }
}

impl Record for Campaign {
    fn doc(&self) -> Doc {
        Doc::Campaigns
    }
    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Record for Asset {
    fn doc(&self) -> Doc {
        Doc::Assets
    }
    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Record for InvestorBook {
    fn doc(&self) -> Doc {
        Doc::InvestorBooks
    }
    fn key(&self) -> String {
        keys::investor_book(&self.campaign_id, &self.wallet_id)
    }
}

impl Record for PurchaseCacheRecord {
    fn doc(&self) -> Doc {
        Doc::PurchaseCache
    }
    fn key(&self) -> String {
        self.hash.clone()
    }
}

impl Record for TxCacheRecord {
    fn doc(&self) -> Doc {
        Doc::TxCache
    }
    fn key(&self) -> String {
        self.hash.clone()
    }
}

/// Typed access on top of any [`LedgerStore`].
#[async_trait]
pub trait RecordStoreExt: LedgerStore {
    /// Load and decode, failing with `RecordNotFound` on a miss.
    async fn load<T>(&self, doc: Doc, key: &str) -> LedgerResult<T>
    where
        T: DeserializeOwned + Send,
    {
        let value = self.get(doc, key).await?;
        decode(doc, key, value)
    }

    /// Load and decode, `None` on a miss.
    async fn find<T>(&self, doc: Doc, key: &str) -> LedgerResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_and_check_exist(doc, key).await? {
            Some(value) => decode(doc, key, value).map(Some),
            None => Ok(None),
        }
    }

    /// Create the record under its own namespace and key.
    async fn insert<T: Record>(&self, record: &T) -> LedgerResult<()> {
        let value = serde_json::to_value(record)?;
        self.create(record.doc(), &record.key(), value).await
    }

    /// Overwrite an existing record.
    async fn save<T: Record>(&self, record: &T) -> LedgerResult<()> {
        let value = serde_json::to_value(record)?;
        self.update(record.doc(), &record.key(), value).await
    }

    async fn query_records<T>(&self, doc: Doc, filter: &RecordFilter) -> LedgerResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.query(doc, filter)
            .await?
            .into_iter()
            .map(|(key, value)| decode(doc, &key, value))
            .collect()
    }
}

impl<S: LedgerStore + ?Sized> RecordStoreExt for S {}

fn decode<T: DeserializeOwned>(doc: Doc, key: &str, value: Value) -> LedgerResult<T> {
    serde_json::from_value(value)
        .map_err(|e| LedgerError::Serialization(format!("{doc}/{key}: {e}")))
}
