use async_trait::async_trait;
use tracing::debug;

use openledger_store::{LedgerStore, RecordStoreExt};
use openledger_types::{
    Asset, Campaign, CampaignStatus, Doc, LedgerError, LedgerResult, TransactionRecord,
};

use super::{TxHandler, require_user_wallets};
use crate::SettleContext;

/// Campaign deposit: the issuer moves asset tokens into a campaign.
///
/// The campaign id travels in `note`. The depositor's balance is debited
/// in `from_domain`; the campaign's deposited and remaining counters grow
/// by the same amount and the backing asset's undeployed supply shrinks.
pub struct DepositHandler;

#[async_trait]
impl<S> TxHandler<S> for DepositHandler
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
            if tx.note.is_empty() {
                return Err(LedgerError::invalid_tx(&tx.id, "deposit names no campaign"));
            }
            let campaign: Campaign = cx.store().load(Doc::Campaigns, &tx.note).await?;
            if campaign.asset_token_id != tx.from_token_id {
                return Err(LedgerError::MixedTokens {
                    expected: campaign.asset_token_id.clone(),
                    found: tx.from_token_id.clone(),
                });
            }
            let asset: Asset = cx
                .store()
                .load(Doc::Assets, campaign.asset_id.as_str())
                .await?;
            let amount = tx.from_token_amount;

            let mut next_asset = asset.clone();
            next_asset.remaining_token =
                asset
                    .remaining_token
                    .checked_sub(amount)
                    .ok_or_else(|| LedgerError::SupplyUnderflow {
                        token: asset.token_id.clone(),
                        supply: asset.remaining_token,
                        amount,
                    })?;
            next_asset.updated_at = cx.timestamp();

            let mut next_campaign = campaign.clone();
            next_campaign.asset_token_amount = campaign.asset_token_amount.try_add(amount)?;
            next_campaign.remaining_asset_token = campaign.remaining_asset_token.try_add(amount)?;
            next_campaign.status = CampaignStatus::Open;
            next_campaign.updated_at = cx.timestamp();

            cx.debit(tx.from_domain, &tx.from_wallet, &tx.from_token_id, amount)
                .await?;
            cx.persist_campaign(campaign, &next_campaign).await?;
            cx.persist_asset(asset, &next_asset).await?;
            debug!(
                tx_id = %tx.id,
                campaign = %next_campaign.id,
                remaining = %next_campaign.remaining_asset_token,
                "campaign deposit applied"
            );
        }
        Ok(())
    }
}
