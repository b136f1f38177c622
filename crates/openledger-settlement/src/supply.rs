//! Per-transaction conservation checker.
//!
//! Value-moving transactions must not create or destroy value:
//! ```text
//! PerToken:  ∀ token: Σ credits(token) == Σ debits(token)
//! Total:     Σ credits == Σ debits            (across tokens, in base units)
//! ```
//! Mint, burn, issue and campaign deposits change supply by design and are
//! not checked here; their supply accounting lives on the token record.

use std::collections::BTreeMap;

use openledger_types::{Amount, LedgerError, LedgerResult, TokenId, TxId, TxType};

/// Which conservation rule a transaction kind must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conservation {
    PerToken,
    Total,
    Unchecked,
}

impl Conservation {
    #[must_use]
    pub fn for_type(tx_type: TxType) -> Self {
        match tx_type {
            TxType::Transfer | TxType::Exchange | TxType::CrossDomainTransfer => Self::PerToken,
            TxType::Swap => Self::Total,
            TxType::Mint
            | TxType::Burn
            | TxType::Issue
            | TxType::CampaignDeposit
            | TxType::TransferNft
            | TxType::DistributionAT
            | TxType::ReturnST => Self::Unchecked,
        }
    }
}

/// Credits and debits recorded while one transaction settles.
#[derive(Debug, Default)]
pub struct SupplyLedger {
    credits: BTreeMap<TokenId, Amount>,
    debits: BTreeMap<TokenId, Amount>,
}

impl SupplyLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_credit(&mut self, token: &TokenId, amount: Amount) -> LedgerResult<()> {
        add_to(&mut self.credits, token, amount)
    }

    pub fn record_debit(&mut self, token: &TokenId, amount: Amount) -> LedgerResult<()> {
        add_to(&mut self.debits, token, amount)
    }

    pub fn reset(&mut self) {
        self.credits.clear();
        self.debits.clear();
    }

    #[must_use]
    pub fn total_credits(&self, token: &TokenId) -> Amount {
        self.credits.get(token).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total_debits(&self, token: &TokenId) -> Amount {
        self.debits.get(token).copied().unwrap_or_default()
    }

    /// Check the recorded movements against `rule`.
    ///
    /// # Errors
    /// Returns [`LedgerError::ConservationViolation`] when they don't net out.
    pub fn verify(&self, rule: Conservation, tx_id: &TxId) -> LedgerResult<()> {
        match rule {
            Conservation::Unchecked => Ok(()),
            Conservation::PerToken => {
                for token in self.credits.keys().chain(self.debits.keys()) {
                    let credited = self.total_credits(token);
                    let debited = self.total_debits(token);
                    if credited != debited {
                        return Err(LedgerError::ConservationViolation {
                            tx_id: tx_id.clone(),
                            reason: format!(
                                "token {token}: credited {credited}, debited {debited}"
                            ),
                        });
                    }
                }
                Ok(())
            }
            Conservation::Total => {
                let credited = Amount::try_sum(self.credits.values().copied())?;
                let debited = Amount::try_sum(self.debits.values().copied())?;
                if credited == debited {
                    Ok(())
                } else {
                    Err(LedgerError::ConservationViolation {
                        tx_id: tx_id.clone(),
                        reason: format!("credited {credited}, debited {debited}"),
                    })
                }
            }
        }
    }
}

fn add_to(
    map: &mut BTreeMap<TokenId, Amount>,
    token: &TokenId,
    amount: Amount,
) -> LedgerResult<()> {
    let slot = map.entry(token.clone()).or_default();
    *slot = slot.try_add(amount)?;
    Ok(())
}
