//! Per-kind settlement handlers and the dispatch table.
//!
//! | kind                       | handler                |
//! |----------------------------|------------------------|
//! | Transfer, Swap, Issue      | [`TwoWalletHandler`]   |
//! | Mint                       | [`MintHandler`]        |
//! | Burn                       | [`BurnHandler`]        |
//! | Exchange                   | [`ExchangeHandler`]    |
//! | CrossDomainTransfer        | [`CrossDomainHandler`] |
//! | CampaignDeposit            | [`DepositHandler`]     |
//! | TransferNft, DistributionAT, ReturnST | none: rejected as unsupported |

mod burn;
mod cross_domain;
mod deposit;
mod exchange;
mod mint;
mod two_wallet;

use async_trait::async_trait;

use openledger_store::LedgerStore;
use openledger_types::{LedgerError, LedgerResult, TransactionRecord, TxType};

use crate::SettleContext;

pub use burn::BurnHandler;
pub use cross_domain::CrossDomainHandler;
pub use deposit::DepositHandler;
pub use exchange::ExchangeHandler;
pub use mint::MintHandler;
pub use two_wallet::TwoWalletHandler;

/// Settlement logic for one transaction kind.
#[async_trait]
pub trait TxHandler<S>: Send + Sync
where
    S: LedgerStore + ?Sized,
{
    /// Records settled together with `tx`, `tx` first. Most kinds settle
    /// alone.
    async fn load_group(
        &self,
        _store: &S,
        tx: TransactionRecord,
    ) -> LedgerResult<Vec<TransactionRecord>> {
        Ok(vec![tx])
    }

    /// Apply the group's effects through `cx`. On error the coordinator
    /// rolls back whatever was journaled.
    async fn settle(
        &self,
        cx: &mut SettleContext<S>,
        group: &[TransactionRecord],
    ) -> LedgerResult<()>;
}

static TWO_WALLET: TwoWalletHandler = TwoWalletHandler;
static MINT: MintHandler = MintHandler;
static BURN: BurnHandler = BurnHandler;
static EXCHANGE: ExchangeHandler = ExchangeHandler;
static CROSS_DOMAIN: CrossDomainHandler = CrossDomainHandler;
static DEPOSIT: DepositHandler = DepositHandler;

/// Handler for `tx_type`, `None` for kinds settlement does not support.
pub fn handler_for<S>(tx_type: TxType) -> Option<&'static dyn TxHandler<S>>
where
    S: LedgerStore + ?Sized + 'static,
{
    match tx_type {
        TxType::Transfer | TxType::Swap | TxType::Issue => Some(&TWO_WALLET),
        TxType::Mint => Some(&MINT),
        TxType::Burn => Some(&BURN),
        TxType::Exchange => Some(&EXCHANGE),
        TxType::CrossDomainTransfer => Some(&CROSS_DOMAIN),
        TxType::CampaignDeposit => Some(&DEPOSIT),
        TxType::TransferNft | TxType::DistributionAT | TxType::ReturnST => None,
    }
}

/// Checks shared by every handler moving value between user wallets.
fn require_user_wallets<S>(cx: &SettleContext<S>, tx: &TransactionRecord) -> LedgerResult<()>
where
    S: LedgerStore + ?Sized,
{
    if cx.is_system(&tx.from_wallet) || cx.is_system(&tx.to_wallet) {
        return Err(LedgerError::ReserveWalletMisuse {
            tx_id: tx.id.clone(),
            reason: "from/to wallet is the reserve wallet".into(),
        });
    }
    require_positive(tx)
}

fn require_positive(tx: &TransactionRecord) -> LedgerResult<()> {
    if tx.from_token_amount.is_zero() || tx.to_token_amount.is_zero() {
        return Err(LedgerError::InvalidAmount {
            reason: format!("transaction {} moves a zero amount", tx.id),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openledger_store::MemoryStore;

    #[test]
    fn every_kind_is_routed_or_explicitly_unsupported() {
        let supported = [
            TxType::Transfer,
            TxType::Swap,
            TxType::Issue,
            TxType::Mint,
            TxType::Burn,
            TxType::Exchange,
            TxType::CrossDomainTransfer,
            TxType::CampaignDeposit,
        ];
        for kind in supported {
            assert!(handler_for::<MemoryStore>(kind).is_some(), "{kind}");
        }
        for kind in [TxType::TransferNft, TxType::DistributionAT, TxType::ReturnST] {
            assert!(handler_for::<MemoryStore>(kind).is_none(), "{kind}");
        }
    }
}
