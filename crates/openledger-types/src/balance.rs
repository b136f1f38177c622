//! Per-domain wallet balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, BalanceDomain, TokenId, WalletId};

/// Balance of one token held by one wallet in one domain.
///
/// `balances` is never negative after a committed mutation; the unsigned
/// [`Amount`] makes that unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub wallet_id: WalletId,
    pub token_id: TokenId,
    pub domain: BalanceDomain,
    pub balances: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BalanceRecord {
    /// Zero balance, used when a wallet is credited for the first time.
    #[must_use]
    pub fn zero(
        domain: BalanceDomain,
        wallet_id: WalletId,
        token_id: TokenId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            wallet_id,
            token_id,
            domain,
            balances: Amount::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_balance(mut self, balances: Amount) -> Self {
        self.balances = balances;
        self
    }
}
