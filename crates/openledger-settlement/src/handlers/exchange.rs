use async_trait::async_trait;
use tracing::debug;

use openledger_store::{LedgerStore, RecordFilter, RecordStoreExt};
use openledger_types::{Doc, LedgerError, LedgerResult, TransactionRecord, TxStatus, TxType};

use super::{TxHandler, require_user_wallets};
use crate::SettleContext;

/// Exchange: every pending leg sharing a correlation id settles as one
/// unit. Either all legs apply or none do.
pub struct ExchangeHandler;

#[async_trait]
impl<S> TxHandler<S> for ExchangeHandler
where
    S: LedgerStore + ?Sized,
{
    async fn load_group(
        &self,
        store: &S,
        tx: TransactionRecord,
    ) -> LedgerResult<Vec<TransactionRecord>> {
        if tx.external_id.is_empty() {
            return Err(LedgerError::IncompleteExchange {
                correlation_id: tx.id.to_string(),
                found: 1,
            });
        }
        let filter = RecordFilter::new()
            .where_eq("external_id", tx.external_id.as_str())
            .where_eq("tx_type", serde_json::to_value(TxType::Exchange)?)
            .where_eq("status", serde_json::to_value(TxStatus::Pending)?)
            .sort_by("created_at");
        let mut legs: Vec<TransactionRecord> =
            store.query_records(Doc::Transactions, &filter).await?;

        // The triggering record leads the group.
        if let Some(pos) = legs.iter().position(|leg| leg.id == tx.id) {
            let own = legs.remove(pos);
            legs.insert(0, own);
        } else {
            legs.insert(0, tx);
        }
        if legs.len() < 2 {
            return Err(LedgerError::IncompleteExchange {
                correlation_id: legs[0].external_id.clone(),
                found: legs.len(),
            });
        }
        debug!(correlation_id = %legs[0].external_id, legs = legs.len(), "exchange group loaded");
        Ok(legs)
    }

    async fn settle(
        &self,
        cx: &mut SettleContext<S>,
        group: &[TransactionRecord],
    ) -> LedgerResult<()> {
        for leg in group {
            require_user_wallets(cx, leg)?;
            cx.debit(
                leg.from_domain,
                &leg.from_wallet,
                &leg.from_token_id,
                leg.from_token_amount,
            )
            .await?;
            cx.credit(
                leg.to_domain,
                &leg.to_wallet,
                &leg.from_token_id,
                leg.from_token_amount,
            )
            .await?;
        }
        Ok(())
    }
}

