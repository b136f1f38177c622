//! Fundraising campaign records and purchase payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, AssetId, CampaignId, RequestId, TokenId, TxStatus, WalletId};

/// Campaign lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CampaignStatus {
    #[default]
    New,
    Open,
    Closed,
}

/// A campaign selling asset tokens for a stable token at a fixed rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub asset_id: AssetId,
    pub asset_token_id: TokenId,
    pub stable_token_id: TokenId,
    /// Asset tokens deposited into the campaign so far.
    pub asset_token_amount: Amount,
    /// Asset tokens still available for purchase.
    pub remaining_asset_token: Amount,
    /// Stable tokens raised so far.
    pub stable_token_amount: Amount,
    /// Stable base units charged per asset base unit.
    pub rate: u64,
    pub status: CampaignStatus,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.remaining_asset_token.is_zero()
    }
}

/// The asset backing a campaign's asset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub token_id: TokenId,
    /// Asset tokens not yet placed into a campaign.
    pub remaining_token: Amount,
    pub updated_at: DateTime<Utc>,
}

/// Cumulative purchases of one investor in one campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorBook {
    pub id: String,
    pub campaign_id: CampaignId,
    pub wallet_id: WalletId,
    pub asset_token_amount: Amount,
    pub stable_token_amount: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One buy order inside a purchase batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub request_id: RequestId,
    pub campaign_id: CampaignId,
    pub wallet_id: WalletId,
    /// Stable token the buyer pays with.
    pub token_id: TokenId,
    /// Asset-token base units requested.
    pub units: Amount,
}

impl PurchaseRequest {
    #[must_use]
    pub fn new(
        request_id: impl Into<RequestId>,
        campaign_id: impl Into<CampaignId>,
        wallet_id: impl Into<WalletId>,
        token_id: impl Into<TokenId>,
        units: u64,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            campaign_id: campaign_id.into(),
            wallet_id: wallet_id.into(),
            token_id: token_id.into(),
            units: Amount::from_base_units(units),
        }
    }
}

/// Outcome of one [`PurchaseRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub request_id: RequestId,
    pub campaign_id: CampaignId,
    pub wallet_id: WalletId,
    pub status: TxStatus,
    /// Asset units actually bought (clamped to remaining capacity).
    pub units_filled: Amount,
    /// Stable units charged.
    pub stable_amount: Amount,
    /// Rejection reason, empty when confirmed.
    #[serde(default)]
    pub error: String,
}

impl PurchaseResult {
    #[must_use]
    pub fn rejected(req: &PurchaseRequest, error: impl Into<String>) -> Self {
        Self {
            request_id: req.request_id.clone(),
            campaign_id: req.campaign_id.clone(),
            wallet_id: req.wallet_id.clone(),
            status: TxStatus::Rejected,
            units_filled: Amount::ZERO,
            stable_amount: Amount::ZERO,
            error: error.into(),
        }
    }

    #[must_use]
    pub fn confirmed(req: &PurchaseRequest, units_filled: Amount, stable_amount: Amount) -> Self {
        Self {
            request_id: req.request_id.clone(),
            campaign_id: req.campaign_id.clone(),
            wallet_id: req.wallet_id.clone(),
            status: TxStatus::Confirmed,
            units_filled,
            stable_amount,
            error: String::new(),
        }
    }
}

/// Stored payload of a processed purchase batch, keyed by content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCacheRecord {
    pub hash: String,
    pub result: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a processed UTXO exchange, keyed by content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCacheRecord {
    pub hash: String,
    pub status: TxStatus,
    #[serde(default)]
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}
