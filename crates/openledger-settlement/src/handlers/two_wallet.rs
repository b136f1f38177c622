use async_trait::async_trait;

use openledger_store::LedgerStore;
use openledger_types::{LedgerError, LedgerResult, TransactionRecord, TxType};

use super::{TxHandler, require_user_wallets};
use crate::SettleContext;

/// Transfer, swap and balance-level issue: debit `from`, credit `to`.
///
/// A transfer must move one token and one amount; swaps and issues may
/// credit a different token than they debit.
pub struct TwoWalletHandler;

#[async_trait]
impl<S> TxHandler<S> for TwoWalletHandler
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
            if tx.tx_type == TxType::Transfer
                && (tx.from_token_id != tx.to_token_id
                    || tx.from_token_amount != tx.to_token_amount)
            {
                return Err(LedgerError::invalid_tx(
                    &tx.id,
                    "transfer must debit and credit the same token and amount",
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
