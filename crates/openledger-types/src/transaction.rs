//! Transaction records.
//!
//! A [`TransactionRecord`] is created `Pending` by request handlers outside
//! this workspace and moved exactly once to `Confirmed` or `Rejected` by
//! settlement. Records are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, BalanceDomain, TokenId, TxId, WalletId};

/// Kind of token movement a transaction describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum TxType {
    Transfer,
    Mint,
    Burn,
    Swap,
    Exchange,
    Issue,
    TransferNft,
    CrossDomainTransfer,
    CampaignDeposit,
    DistributionAT,
    ReturnST,
}

impl std::fmt::Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transfer => "TRANSFER",
            Self::Mint => "MINT",
            Self::Burn => "BURN",
            Self::Swap => "SWAP",
            Self::Exchange => "EXCHANGE",
            Self::Issue => "ISSUE",
            Self::TransferNft => "TRANSFER_NFT",
            Self::CrossDomainTransfer => "CROSS_DOMAIN_TRANSFER",
            Self::CampaignDeposit => "CAMPAIGN_DEPOSIT",
            Self::DistributionAT => "DISTRIBUTION_AT",
            Self::ReturnST => "RETURN_ST",
        };
        f.write_str(name)
    }
}

/// Settlement status. `Confirmed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub enum TxStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl TxStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// A token-movement intent awaiting (or having completed) settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TxId,
    /// Wallet that signed the request; informational only.
    pub spender_wallet: WalletId,
    pub from_wallet: WalletId,
    pub to_wallet: WalletId,
    pub from_token_id: TokenId,
    pub to_token_id: TokenId,
    pub from_token_amount: Amount,
    pub to_token_amount: Amount,
    pub tx_type: TxType,
    pub status: TxStatus,
    /// Free-form context. Campaign deposits carry the campaign id here.
    #[serde(default)]
    pub note: String,
    /// Domain debited by the transaction.
    #[serde(default)]
    pub from_domain: BalanceDomain,
    /// Domain credited by the transaction.
    #[serde(default)]
    pub to_domain: BalanceDomain,
    /// Originating ledger transaction id; exchange legs share it.
    #[serde(default)]
    pub external_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Builder entry point for a pending record moving one token.
    #[must_use]
    pub fn pending(
        id: TxId,
        tx_type: TxType,
        from_wallet: WalletId,
        to_wallet: WalletId,
        token: TokenId,
        amount: Amount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            spender_wallet: from_wallet.clone(),
            from_wallet,
            to_wallet,
            from_token_id: token.clone(),
            to_token_id: token,
            from_token_amount: amount,
            to_token_amount: amount,
            tx_type,
            status: TxStatus::Pending,
            note: String::new(),
            from_domain: BalanceDomain::Spot,
            to_domain: BalanceDomain::Spot,
            external_id: String::new(),
            created_at,
            updated_at: created_at,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = external_id.into();
        self
    }

    #[must_use]
    pub fn with_domains(mut self, from: BalanceDomain, to: BalanceDomain) -> Self {
        self.from_domain = from;
        self.to_domain = to;
        self
    }

    /// Set the credited leg when it differs from the debited one (swaps,
    /// deposits).
    #[must_use]
    pub fn with_to_leg(mut self, token: TokenId, amount: Amount) -> Self {
        self.to_token_id = token;
        self.to_token_amount = amount;
        self
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == TxStatus::Pending
    }

    /// Key grouping exchange legs: the external id, or the record id when
    /// the record carries none.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        if self.external_id.is_empty() {
            self.id.as_str()
        } else {
            &self.external_id
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl TransactionRecord {
    fn dummy(tx_type: TxType, from: &str, to: &str, token: &str, amount: u64) -> Self {
        Self::pending(
            TxId::new(format!("tx-{}", uuid::Uuid::now_v7().simple())),
            tx_type,
            WalletId::new(from),
            WalletId::new(to),
            TokenId::new(token),
            Amount::from_base_units(amount),
            Utc::now(),
        )
    }

    pub fn dummy_transfer(from: &str, to: &str, token: &str, amount: u64) -> Self {
        Self::dummy(TxType::Transfer, from, to, token, amount)
    }

    pub fn dummy_mint(to: &str, token: &str, amount: u64) -> Self {
        Self::dummy(
            TxType::Mint,
            crate::constants::SYSTEM_WALLET,
            to,
            token,
            amount,
        )
    }

    pub fn dummy_burn(from: &str, token: &str, amount: u64) -> Self {
        Self::dummy(
            TxType::Burn,
            from,
            crate::constants::SYSTEM_WALLET,
            token,
            amount,
        )
    }

    pub fn dummy_exchange_leg(
        correlation: &str,
        from: &str,
        to: &str,
        token: &str,
        amount: u64,
    ) -> Self {
        Self::dummy(TxType::Exchange, from, to, token, amount).with_external_id(correlation)
    }

    pub fn dummy_cross_domain(
        wallet: &str,
        token: &str,
        amount: u64,
        from: BalanceDomain,
        to: BalanceDomain,
    ) -> Self {
        Self::dummy(TxType::CrossDomainTransfer, wallet, wallet, token, amount)
            .with_domains(from, to)
    }

    pub fn dummy_deposit(from: &str, campaign: &str, token: &str, amount: u64) -> Self {
        Self::dummy(TxType::CampaignDeposit, from, from, token, amount).with_note(campaign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_records_start_pending() {
        let tx = TransactionRecord::dummy_transfer("a", "b", "USDT", 10);
        assert!(tx.is_pending());
        assert!(!tx.status.is_terminal());
        assert_eq!(tx.from_token_amount, tx.to_token_amount);
    }

    #[test]
    fn correlation_falls_back_to_id() {
        let tx = TransactionRecord::dummy_transfer("a", "b", "USDT", 10);
        assert_eq!(tx.correlation_id(), tx.id.as_str());
        let leg = TransactionRecord::dummy_exchange_leg("x-1", "a", "b", "USDT", 10);
        assert_eq!(leg.correlation_id(), "x-1");
    }

    #[test]
    fn mint_and_burn_use_reserve_wallet() {
        let mint = TransactionRecord::dummy_mint("a", "T", 1);
        let burn = TransactionRecord::dummy_burn("a", "T", 1);
        assert!(mint.from_wallet.is_system());
        assert!(burn.to_wallet.is_system());
    }

    #[test]
    fn missing_optional_fields_deserialize_with_defaults() {
        let mut value =
            serde_json::to_value(TransactionRecord::dummy_transfer("a", "b", "T", 1)).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("note");
        obj.remove("from_domain");
        obj.remove("external_id");
        let back: TransactionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.from_domain, BalanceDomain::Spot);
        assert!(back.note.is_empty());
    }

    #[test]
    fn tx_status_display() {
        assert_eq!(TxStatus::Confirmed.to_string(), "CONFIRMED");
        assert_eq!(
            TxType::CrossDomainTransfer.to_string(),
            "CROSS_DOMAIN_TRANSFER"
        );
    }
}
