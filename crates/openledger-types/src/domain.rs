//! Store namespaces and balance domains.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace of a record in the ledger store.
///
/// The variant name doubles as the key prefix used for derived ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Doc {
    Transactions,
    Tokens,
    SpotBalances,
    CampaignBalances,
    ExchangeBalances,
    Utxos,
    Enrollments,
    Campaigns,
    Assets,
    InvestorBooks,
    PurchaseCache,
    TxCache,
}

impl Doc {
    /// Prefix mixed into derived ids and stored keys.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Transactions => "Transactions",
            Self::Tokens => "Tokens",
            Self::SpotBalances => "SpotBalances",
            Self::CampaignBalances => "CampaignBalances",
            Self::ExchangeBalances => "ExchangeBalances",
            Self::Utxos => "Utxos",
            Self::Enrollments => "Enrollments",
            Self::Campaigns => "Campaigns",
            Self::Assets => "Assets",
            Self::InvestorBooks => "InvestorBooks",
            Self::PurchaseCache => "PurchaseCache",
            Self::TxCache => "TxCache",
        }
    }
}

impl fmt::Display for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Balance partition for the same wallet/token pair.
///
/// Spot holdings, campaign escrow and exchange escrow are separate ledgers;
/// moving value between them is a cross-domain transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub enum BalanceDomain {
    #[default]
    Spot,
    Campaign,
    Exchange,
}

impl BalanceDomain {
    /// Store namespace holding this domain's balance records.
    #[must_use]
    pub fn doc(self) -> Doc {
        match self {
            Self::Spot => Doc::SpotBalances,
            Self::Campaign => Doc::CampaignBalances,
            Self::Exchange => Doc::ExchangeBalances,
        }
    }
}

impl fmt::Display for BalanceDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spot => write!(f, "Spot"),
            Self::Campaign => write!(f, "Campaign"),
            Self::Exchange => write!(f, "Exchange"),
        }
    }
}
