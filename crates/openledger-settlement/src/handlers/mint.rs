use async_trait::async_trait;
use tracing::debug;

use openledger_store::{LedgerStore, RecordStoreExt};
use openledger_types::{Doc, LedgerError, LedgerResult, TokenType, TransactionRecord};

use super::{TxHandler, require_positive};
use crate::SettleContext;

/// Mint: the reserve wallet creates supply and credits `to`.
///
/// The token's total supply is persisted immediately; the credit goes
/// through the cache.
pub struct MintHandler;

#[async_trait]
impl<S> TxHandler<S> for MintHandler
where
    S: LedgerStore + ?Sized,
{
    async fn settle(
        &self,
        cx: &mut SettleContext<S>,
        group: &[TransactionRecord],
    ) -> LedgerResult<()> {
        for tx in group {
            if !cx.is_system(&tx.from_wallet) {
                return Err(LedgerError::ReserveWalletMisuse {
                    tx_id: tx.id.clone(),
                    reason: "mint must come from the reserve wallet".into(),
                });
            }
            if cx.is_system(&tx.to_wallet) {
                return Err(LedgerError::ReserveWalletMisuse {
                    tx_id: tx.id.clone(),
                    reason: "mint cannot credit the reserve wallet".into(),
                });
            }
            require_positive(tx)?;

            let previous: TokenType = cx.store().load(Doc::Tokens, tx.to_token_id.as_str()).await?;
            let mut updated = previous.clone();
            updated.total_supply = previous.supply_after_mint(tx.to_token_amount)?;
            debug!(
                tx_id = %tx.id,
                token = %updated.id,
                supply = %updated.total_supply,
                "mint supply"
            );
            cx.persist_token(previous, &updated).await?;

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
