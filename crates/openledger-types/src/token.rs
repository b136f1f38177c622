//! Token types and issuance enrollment.

use serde::{Deserialize, Serialize};

use crate::{Amount, LedgerError, LedgerResult, TokenId, WalletId};

/// Supply counters for one token.
///
/// `total_supply` never exceeds `max_supply` when a cap is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenType {
    pub id: TokenId,
    pub total_supply: Amount,
    /// `None` means unbounded.
    #[serde(default)]
    pub max_supply: Option<Amount>,
    /// Conversion rate against the stable token, in stable base units per unit.
    #[serde(default)]
    pub rate: u64,
}

impl TokenType {
    #[must_use]
    pub fn new(id: impl Into<TokenId>, total_supply: Amount, max_supply: Option<Amount>) -> Self {
        Self {
            id: id.into(),
            total_supply,
            max_supply,
            rate: 0,
        }
    }

    /// Total supply after minting `amount`, checked against the cap.
    pub fn supply_after_mint(&self, amount: Amount) -> LedgerResult<Amount> {
        let new_total = self.total_supply.try_add(amount)?;
        match self.max_supply {
            Some(max_supply) if new_total > max_supply => Err(LedgerError::OverMaxSupply {
                token: self.id.clone(),
                new_total,
                max_supply,
            }),
            _ => Ok(new_total),
        }
    }

    /// Total supply after burning `amount`.
    pub fn supply_after_burn(&self, amount: Amount) -> LedgerResult<Amount> {
        self.total_supply
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::SupplyUnderflow {
                token: self.id.clone(),
                supply: self.total_supply,
                amount,
            })
    }
}

/// Issuance allow-lists for a token.
///
/// Each list is a comma-joined set of wallet ids; an empty list admits any
/// wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub token_id: TokenId,
    #[serde(default)]
    pub from_wallet_id: String,
    #[serde(default)]
    pub to_wallet_id: String,
}

impl Enrollment {
    #[must_use]
    pub fn allows_from(&self, wallet: &WalletId) -> bool {
        list_admits(&self.from_wallet_id, wallet)
    }

    #[must_use]
    pub fn allows_to(&self, wallet: &WalletId) -> bool {
        list_admits(&self.to_wallet_id, wallet)
    }

    /// Fails with [`LedgerError::NotEnrolled`] unless both ends are admitted.
    pub fn check(&self, from: &WalletId, to: &WalletId) -> LedgerResult<()> {
        if !self.allows_from(from) {
            return Err(LedgerError::NotEnrolled {
                wallet: from.clone(),
                token: self.token_id.clone(),
            });
        }
        if !self.allows_to(to) {
            return Err(LedgerError::NotEnrolled {
                wallet: to.clone(),
                token: self.token_id.clone(),
            });
        }
        Ok(())
    }
}

fn list_admits(list: &str, wallet: &WalletId) -> bool {
    let list = list.trim();
    list.is_empty() || list.split(',').any(|w| w.trim() == wallet.as_str())
}
