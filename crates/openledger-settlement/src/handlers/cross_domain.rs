use async_trait::async_trait;

use openledger_store::LedgerStore;
use openledger_types::{LedgerError, LedgerResult, TransactionRecord};

use super::{TxHandler, require_user_wallets};
use crate::SettleContext;

/// Move a wallet's tokens from one balance domain to another.
pub struct CrossDomainHandler;

#[async_trait]
impl<S> TxHandler<S> for CrossDomainHandler
where
    S: LedgerStore + ?Sized,
{
    async fn settle(
        &self,
        cx: &mut SettleContext<S>,
        group: &[TransactionRecord],
    ) -> LedgerResult<()> {
        for tx in group {
            require_user_wallets(cx, tx)?;
            if tx.from_domain == tx.to_domain {
                return Err(LedgerError::invalid_tx(
                    &tx.id,
                    format!("cross-domain transfer within {}", tx.from_domain),
                ));
            }
            if tx.from_token_id != tx.to_token_id || tx.from_token_amount != tx.to_token_amount {
                return Err(LedgerError::invalid_tx(
                    &tx.id,
                    "cross-domain transfer must keep token and amount",
                ));
            }
            cx.debit(
                tx.from_domain,
                &tx.from_wallet,
                &tx.from_token_id,
                tx.from_token_amount,
            )
            .await?;
            cx.credit(
                tx.to_domain,
                &tx.to_wallet,
                &tx.to_token_id,
                tx.to_token_amount,
            )
            .await?;
        }
        Ok(())
    }
}
