//! Settlement context: shared balance cache plus a per-transaction rollback
//! journal.
//!
//! Handlers never touch the cache or the store directly. They go through
//! [`SettleContext`], which journals every applied step so that a failure
//! part-way through a transaction (or an exchange group) can be undone in
//! reverse order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;

use openledger_store::{LedgerStore, RecordStoreExt};
use openledger_types::{
    Amount, Asset, BalanceDomain, Campaign, LedgerResult, TokenId, TokenType, TxId, WalletId,
};

use crate::balance_cache::{BalanceCache, BalanceKey};
use crate::supply::{Conservation, SupplyLedger};

/// An applied step and how to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackStep {
    /// A debit; undone by crediting the same amount back.
    SubFromWallet { key: BalanceKey, amount: Amount },
    /// A credit; undone by debiting the same amount.
    AddToWallet { key: BalanceKey, amount: Amount },
    /// A persisted token-supply change; undone by writing the previous record.
    RestoreToken(TokenType),
    RestoreCampaign(Campaign),
    RestoreAsset(Asset),
}

/// Mutable state of one settlement batch.
pub struct SettleContext<S: ?Sized> {
    store: Arc<S>,
    timestamp: DateTime<Utc>,
    system_wallet: WalletId,
    cache: BalanceCache<S>,
    journal: Vec<RollbackStep>,
    ledger: SupplyLedger,
}

impl<S> SettleContext<S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: Arc<S>, timestamp: DateTime<Utc>, system_wallet: WalletId) -> Self {
        Self {
            cache: BalanceCache::new(Arc::clone(&store), timestamp),
            store,
            timestamp,
            system_wallet,
            journal: Vec::new(),
            ledger: SupplyLedger::new(),
        }
    }

    pub fn store(&self) -> &S {
        self.store.as_ref()
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn is_system(&self, wallet: &WalletId) -> bool {
        *wallet == self.system_wallet
    }

    #[must_use]
    pub fn cache(&self) -> &BalanceCache<S> {
        &self.cache
    }

    #[must_use]
    pub fn journal(&self) -> &[RollbackStep] {
        &self.journal
    }

    /// Debit through the cache and journal it.
    pub async fn debit(
        &mut self,
        domain: BalanceDomain,
        wallet: &WalletId,
        token: &TokenId,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.cache.sub_amount(domain, wallet, token, amount).await?;
        self.journal.push(RollbackStep::SubFromWallet {
            key: BalanceKey::new(domain, wallet, token),
            amount,
        });
        self.ledger.record_debit(token, amount)
    }

    /// Credit through the cache and journal it.
    pub async fn credit(
        &mut self,
        domain: BalanceDomain,
        wallet: &WalletId,
        token: &TokenId,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.cache.add_amount(domain, wallet, token, amount).await?;
        self.journal.push(RollbackStep::AddToWallet {
            key: BalanceKey::new(domain, wallet, token),
            amount,
        });
        self.ledger.record_credit(token, amount)
    }

    /// Persist a token record immediately, remembering `previous`.
    pub async fn persist_token(
        &mut self,
        previous: TokenType,
        updated: &TokenType,
    ) -> LedgerResult<()> {
        self.store.save(updated).await?;
        self.journal.push(RollbackStep::RestoreToken(previous));
        Ok(())
    }

    pub async fn persist_campaign(
        &mut self,
        previous: Campaign,
        updated: &Campaign,
    ) -> LedgerResult<()> {
        self.store.save(updated).await?;
        self.journal.push(RollbackStep::RestoreCampaign(previous));
        Ok(())
    }

    pub async fn persist_asset(&mut self, previous: Asset, updated: &Asset) -> LedgerResult<()> {
        self.store.save(updated).await?;
        self.journal.push(RollbackStep::RestoreAsset(previous));
        Ok(())
    }

    /// Start a new transaction: forget the previous journal and movements.
    pub(crate) fn begin(&mut self) {
        self.journal.clear();
        self.ledger.reset();
    }

    pub(crate) fn verify(&self, rule: Conservation, tx_id: &TxId) -> LedgerResult<()> {
        self.ledger.verify(rule, tx_id)
    }

    /// Undo the journal in reverse order. Failures are logged and the
    /// remaining steps still run.
    pub(crate) async fn rollback(&mut self, tx_id: &TxId) {
        while let Some(step) = self.journal.pop() {
            let result = match &step {
                RollbackStep::SubFromWallet { key, amount } => self
                    .cache
                    .add_amount(key.domain, &key.wallet, &key.token, *amount)
                    .await
                    .map(|_| ()),
                RollbackStep::AddToWallet { key, amount } => {
                    let undone = self
                        .cache
                        .sub_amount(key.domain, &key.wallet, &key.token, *amount)
                        .await
                        .map(|_| ());
                    self.cache.forget_if_unused(key);
                    undone
                }
                RollbackStep::RestoreToken(token) => self.store.save(token).await,
                RollbackStep::RestoreCampaign(campaign) => self.store.save(campaign).await,
                RollbackStep::RestoreAsset(asset) => self.store.save(asset).await,
            };
            if let Err(err) = result {
                error!(%tx_id, ?step, error = %err, "rollback step failed");
            }
        }
        self.ledger.reset();
    }

    pub(crate) async fn flush(&mut self) -> LedgerResult<usize> {
        self.cache.flush().await
    }
}
