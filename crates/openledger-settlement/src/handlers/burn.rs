use async_trait::async_trait;

use openledger_store::{LedgerStore, RecordStoreExt};
use openledger_types::{Doc, LedgerError, LedgerResult, TokenType, TransactionRecord};

use super::{TxHandler, require_positive};
use crate::SettleContext;

/// Burn: debit `from`, send to the reserve wallet, shrink total supply.
pub struct BurnHandler;

#[async_trait]
impl<S> TxHandler<S> for BurnHandler
where
    S: LedgerStore + ?Sized,
{
    async fn settle(
        &self,
        cx: &mut SettleContext<S>,
        group: &[TransactionRecord],
    ) -> LedgerResult<()> {
        for tx in group {
            if !cx.is_system(&tx.to_wallet) {
                return Err(LedgerError::ReserveWalletMisuse {
                    tx_id: tx.id.clone(),
                    reason: "burn must go to the reserve wallet".into(),
                });
            }
            if cx.is_system(&tx.from_wallet) {
                return Err(LedgerError::ReserveWalletMisuse {
                    tx_id: tx.id.clone(),
                    reason: "reserve wallet cannot burn".into(),
                });
            }
            require_positive(tx)?;

            let previous: TokenType = cx
                .store()
                .load(Doc::Tokens, tx.from_token_id.as_str())
                .await?;
            let mut updated = previous.clone();
            updated.total_supply = previous.supply_after_burn(tx.from_token_amount)?;

            cx.debit(
                tx.from_domain,
                &tx.from_wallet,
                &tx.from_token_id,
                tx.from_token_amount,
            )
            .await?;
            cx.persist_token(previous, &updated).await?;
        }
        Ok(())
    }
}
