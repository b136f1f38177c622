//! Batch settlement of pending transactions.
//!
//! One call to [`SettlementCoordinator::settle`] walks the supplied ids in
//! order against a single shared [`SettleContext`]. A failing transaction
//! is rolled back and marked `Rejected`; it never stops its siblings.
//!
//! Persistence happens in two phases once the loop is done: status writes
//! first, then the balance cache flush. A crash between the phases leaves
//! `Confirmed` records whose balance changes were never written; the
//! caller is expected to reconcile from the report in that case.

use std::collections::HashSet;
use std::sync::Arc;

use openledger_store::{LedgerStore, RecordFilter, RecordStoreExt};
use openledger_types::{
    Doc, LedgerConfig, LedgerError, LedgerResult, TransactionRecord, TxContext, TxId, TxStatus,
    TxType,
};

use crate::SettleContext;
use crate::handlers::handler_for;
use crate::supply::Conservation;

/// What happened to each id passed to [`SettlementCoordinator::settle`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementReport {
    /// Every record moved to `Confirmed`, exchange legs included.
    pub confirmed: Vec<TxId>,
    /// Every record moved to `Rejected`, with the reason.
    pub rejected: Vec<(TxId, String)>,
    /// Ids that were missing, already terminal, or settled earlier in the
    /// same batch as part of a group.
    pub skipped: Vec<TxId>,
    /// Balance records written by the flush.
    pub balances_written: usize,
}

impl SettlementReport {
    #[must_use]
    pub fn is_confirmed(&self, id: &TxId) -> bool {
        self.confirmed.contains(id)
    }

    #[must_use]
    pub fn rejection(&self, id: &TxId) -> Option<&str> {
        self.rejected
            .iter()
            .find(|(rejected, _)| rejected == id)
            .map(|(_, reason)| reason.as_str())
    }
}

/// Outcome of one transaction (or one exchange group).
struct TxOutcome {
    group: Vec<TransactionRecord>,
    result: LedgerResult<()>,
}

/// Drives pending transactions to a terminal status.
pub struct SettlementCoordinator<S: ?Sized> {
    store: Arc<S>,
    config: LedgerConfig,
}

impl<S> SettlementCoordinator<S>
where
    S: LedgerStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Pending transaction ids, oldest first, at most `page_size` of them.
    ///
    /// Exchange legs sharing an external id are listed once: settling any
    /// leg settles the whole group.
    pub async fn pending_transaction_ids(&self) -> LedgerResult<Vec<TxId>> {
        let filter = RecordFilter::new()
            .where_eq("status", serde_json::to_value(TxStatus::Pending)?)
            .sort_by("created_at");
        let pending: Vec<TransactionRecord> =
            self.store.query_records(Doc::Transactions, &filter).await?;

        let mut seen_groups = HashSet::new();
        let ids = pending
            .into_iter()
            .filter(|tx| {
                tx.tx_type != TxType::Exchange || seen_groups.insert(tx.correlation_id().to_owned())
            })
            .take(self.config.page_size)
            .map(|tx| tx.id)
            .collect();
        Ok(ids)
    }

    /// Settle `ids` in order.
    ///
    /// Only store failures while loading a record or persisting the
    /// results are returned as errors. Per-transaction failures end up in
    /// [`SettlementReport::rejected`].
    pub async fn settle(&self, cx: &TxContext, ids: &[TxId]) -> LedgerResult<SettlementReport> {
        let mut scx = SettleContext::new(
            Arc::clone(&self.store),
            cx.timestamp,
            self.config.system_wallet.clone(),
        );
        let mut report = SettlementReport::default();
        let mut settled: HashSet<TxId> = HashSet::new();
        let mut updates: Vec<TransactionRecord> = Vec::new();

        for id in ids {
            if settled.contains(id) {
                report.skipped.push(id.clone());
                continue;
            }
            let Some(tx) = self
                .store
                .find::<TransactionRecord>(Doc::Transactions, id.as_str())
                .await?
            else {
                tracing::debug!(tx_id = %id, "Transaction not found, skipping");
                report.skipped.push(id.clone());
                continue;
            };
            if !tx.is_pending() {
                tracing::debug!(
                    tx_id = %id,
                    status = %tx.status,
                    "Transaction already terminal, skipping"
                );
                report.skipped.push(id.clone());
                continue;
            }

            let TxOutcome { group, result } = Self::settle_one(&mut scx, tx).await;
            let status = match &result {
                Ok(()) => TxStatus::Confirmed,
                Err(_) => TxStatus::Rejected,
            };
            for mut member in group {
                member.status = status;
                member.updated_at = cx.timestamp;
                settled.insert(member.id.clone());
                match &result {
                    Ok(()) => {
                        tracing::info!(
                            tx_id = %member.id,
                            tx_type = %member.tx_type,
                            "Transaction confirmed"
                        );
                        report.confirmed.push(member.id.clone());
                    }
                    Err(err) => {
                        tracing::warn!(
                            tx_id = %member.id,
                            tx_type = %member.tx_type,
                            error = %err,
                            "Transaction rejected"
                        );
                        report.rejected.push((member.id.clone(), err.to_string()));
                    }
                }
                updates.push(member);
            }
        }

        // Phase 1: statuses.
        for record in &updates {
            self.store.save(record).await?;
        }
        // Phase 2: balances.
        report.balances_written = scx.flush().await?;

        tracing::info!(
            invocation = %cx.invocation_id,
            confirmed = report.confirmed.len(),
            rejected = report.rejected.len(),
            skipped = report.skipped.len(),
            balances = report.balances_written,
            "Settlement batch complete"
        );
        Ok(report)
    }

    async fn settle_one(scx: &mut SettleContext<S>, tx: TransactionRecord) -> TxOutcome {
        let Some(handler) = handler_for::<S>(tx.tx_type) else {
            let err = LedgerError::invalid_tx(
                &tx.id,
                format!("{} is not settled by this engine", tx.tx_type),
            );
            return TxOutcome {
                group: vec![tx],
                result: Err(err),
            };
        };

        let group = match handler.load_group(scx.store(), tx.clone()).await {
            Ok(group) => group,
            Err(err) => {
                return TxOutcome {
                    group: vec![tx],
                    result: Err(err),
                };
            }
        };

        scx.begin();
        let mut result = handler.settle(scx, &group).await;
        if result.is_ok() {
            result = scx.verify(Conservation::for_type(tx.tx_type), &tx.id);
        }
        if result.is_err() {
            scx.rollback(&tx.id).await;
        }
        TxOutcome { group, result }
    }
}
