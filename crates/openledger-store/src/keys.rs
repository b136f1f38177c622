//! Composite key layout.
//!
//! Keys are unique within a [`Doc`](openledger_types::Doc) namespace only.

use openledger_types::{CampaignId, TokenId, WalletId};

/// Balance key; the domain is carried by the namespace, not the key.
#[must_use]
pub fn balance(wallet: &WalletId, token: &TokenId) -> String {
    format!("{wallet}_{token}")
}

#[must_use]
pub fn investor_book(campaign: &CampaignId, wallet: &WalletId) -> String {
    format!("{campaign}_{wallet}")
}
