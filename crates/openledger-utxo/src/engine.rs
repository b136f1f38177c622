//! UTXO-level token flows.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use openledger_store::{LedgerStore, RecordStoreExt};
use openledger_types::{
    Amount, Doc, Enrollment, LedgerConfig, LedgerError, LedgerResult, TokenId, TokenType,
    TxCacheRecord, TxContext, TxId, TxStatus, TxType, UtxoId, UtxoOutputRequest, UtxoRecord,
    WalletId, content_hash,
};

use crate::validator::{
    self, InputSummary, OutputSummary, validate_and_summarize_inputs,
    validate_and_summarize_outputs,
};

/// One leg of an exchange: inputs and outputs of a single token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangePair {
    pub token_id: TokenId,
    pub inputs: Vec<UtxoId>,
    pub outputs: Vec<UtxoOutputRequest>,
}

/// What a successful flow did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoReceipt {
    pub tx_id: TxId,
    pub tx_type: TxType,
    /// Inputs consumed (as they were before being marked spent).
    pub spent: Vec<UtxoRecord>,
    pub created: Vec<UtxoRecord>,
    /// Supply added to the issued or minted token.
    pub minted: Amount,
    /// Supply removed by outputs to the reserve wallet.
    pub burned: Amount,
    /// `true` when an identical exchange had already been confirmed and
    /// nothing was written.
    pub replayed: bool,
}

impl UtxoReceipt {
    fn new(cx: &TxContext, tx_type: TxType) -> Self {
        Self {
            tx_id: TxId::new(cx.derive_id(Doc::Transactions, "")),
            tx_type,
            spent: Vec::new(),
            created: Vec::new(),
            minted: Amount::ZERO,
            burned: Amount::ZERO,
            replayed: false,
        }
    }
}

/// Spend engine over a [`LedgerStore`].
pub struct UtxoEngine<S: ?Sized> {
    store: Arc<S>,
    reserve: WalletId,
}

impl<S> UtxoEngine<S>
where
    S: LedgerStore + ?Sized,
{
    /// Outputs to `config.system_wallet` are burned.
    pub fn new(store: Arc<S>, config: &LedgerConfig) -> Self {
        Self {
            store,
            reserve: config.system_wallet.clone(),
        }
    }

    /// Create a fresh UTXO of `amount` for `wallet`, raising the token's
    /// total supply.
    pub async fn mint(
        &self,
        cx: &TxContext,
        wallet: &WalletId,
        token: &TokenId,
        amount: Amount,
    ) -> LedgerResult<UtxoReceipt> {
        let mut receipt = UtxoReceipt::new(cx, TxType::Mint);
        if wallet == &self.reserve {
            return Err(LedgerError::ReserveWalletMisuse {
                tx_id: receipt.tx_id,
                reason: "cannot mint to the reserve wallet".into(),
            });
        }
        let outputs = validate_and_summarize_outputs(
            &cx.invocation_id,
            0,
            &[UtxoOutputRequest {
                wallet_id: wallet.clone(),
                token_id: token.clone(),
                amount,
            }],
            &self.reserve,
        )?;
        let mut token_type = self.load_token(token).await?;
        token_type.total_supply = token_type.supply_after_mint(amount)?;

        validator::commit(self.store.as_ref(), &[], &outputs.records).await?;
        self.store.save(&token_type).await?;

        info!(tx_id = %receipt.tx_id, %wallet, %token, %amount, "utxo mint");
        receipt.created = outputs.records;
        receipt.minted = amount;
        Ok(receipt)
    }

    /// Move value between wallets; inputs and outputs must balance exactly
    /// and carry one token.
    pub async fn transfer(
        &self,
        cx: &TxContext,
        inputs: &[UtxoId],
        outputs: &[UtxoOutputRequest],
    ) -> LedgerResult<UtxoReceipt> {
        let (ins, outs) = self.balanced_spend(cx, inputs, outputs, 0).await?;
        validator::commit(self.store.as_ref(), &ins.records, &outs.records).await?;

        let mut receipt = UtxoReceipt::new(cx, TxType::Transfer);
        info!(tx_id = %receipt.tx_id, total = %ins.total, "utxo transfer");
        receipt.spent = ins.records;
        receipt.created = outs.records;
        Ok(receipt)
    }

    /// Balanced spend in which outputs to the reserve wallet are destroyed:
    /// they are created spent and their total leaves the token's supply.
    pub async fn burn(
        &self,
        cx: &TxContext,
        inputs: &[UtxoId],
        outputs: &[UtxoOutputRequest],
    ) -> LedgerResult<UtxoReceipt> {
        let mut receipt = UtxoReceipt::new(cx, TxType::Burn);
        let (ins, outs) = self.balanced_spend(cx, inputs, outputs, 0).await?;
        let burned = outs.burned(&self.reserve)?;
        if burned.is_zero() {
            return Err(LedgerError::ReserveWalletMisuse {
                tx_id: receipt.tx_id,
                reason: "burn has no output to the reserve wallet".into(),
            });
        }
        let mut token_type = self.load_token(ins.token()?).await?;
        token_type.total_supply = token_type.supply_after_burn(burned)?;

        validator::commit(self.store.as_ref(), &ins.records, &outs.records).await?;
        self.store.save(&token_type).await?;

        info!(tx_id = %receipt.tx_id, token = %token_type.id, %burned, "utxo burn");
        receipt.spent = ins.records;
        receipt.created = outs.records;
        receipt.burned = burned;
        Ok(receipt)
    }

    /// Convert stable-token inputs into newly issued asset tokens.
    ///
    /// Outputs in the input token are change; every other output must be
    /// one asset token. Change must be strictly less than the inputs, and
    /// the difference is the minted amount, which must equal the asset
    /// outputs and fit under the asset token's max supply. The asset
    /// token's enrollment, when present, must admit the issuer and every
    /// asset recipient.
    pub async fn issue(
        &self,
        cx: &TxContext,
        inputs: &[UtxoId],
        outputs: &[UtxoOutputRequest],
    ) -> LedgerResult<UtxoReceipt> {
        let mut receipt = UtxoReceipt::new(cx, TxType::Issue);
        let ins = validate_and_summarize_inputs(self.store.as_ref(), inputs).await?;
        let stable = ins.token()?.clone();
        let issuer = ins.records[0].wallet_id.clone();
        let outs = validate_and_summarize_outputs(&cx.invocation_id, 0, outputs, &self.reserve)?;

        let (change, asset): (Vec<&UtxoRecord>, Vec<&UtxoRecord>) =
            outs.records.iter().partition(|r| r.token_id == stable);
        let Some(asset_token) = asset.first().map(|r| r.token_id.clone()) else {
            return Err(LedgerError::invalid_tx(
                &receipt.tx_id,
                "issue has no asset-token output",
            ));
        };
        if let Some(other) = asset.iter().find(|r| r.token_id != asset_token) {
            return Err(LedgerError::MixedTokens {
                expected: asset_token,
                found: other.token_id.clone(),
            });
        }

        let change_total = Amount::try_sum(change.iter().map(|r| r.amount))?;
        let asset_total = Amount::try_sum(asset.iter().map(|r| r.amount))?;
        let minted = match ins.total.checked_sub(change_total) {
            Some(minted) if !minted.is_zero() => minted,
            _ => {
                return Err(LedgerError::AmountMismatch {
                    inputs: ins.total,
                    outputs: change_total,
                });
            }
        };
        if minted != asset_total {
            return Err(LedgerError::AmountMismatch {
                inputs: minted,
                outputs: asset_total,
            });
        }

        if let Some(enrollment) = self
            .store
            .find::<Enrollment>(Doc::Enrollments, asset_token.as_str())
            .await?
        {
            for recipient in asset.iter().map(|r| &r.wallet_id) {
                enrollment.check(&issuer, recipient)?;
            }
        }

        let mut token_type = self.load_token(&asset_token).await?;
        token_type.total_supply = token_type.supply_after_mint(minted)?;

        validator::commit(self.store.as_ref(), &ins.records, &outs.records).await?;
        self.store.save(&token_type).await?;

        info!(tx_id = %receipt.tx_id, %issuer, %asset_token, %minted, "utxo issue");
        receipt.spent = ins.records;
        receipt.created = outs.records;
        receipt.minted = minted;
        Ok(receipt)
    }

    /// Settle several single-token pairs atomically with respect to
    /// validation: every pair is checked before anything is written.
    ///
    /// Idempotent by content hash of `(pairs, metadata)`. A replay of a
    /// confirmed exchange returns a receipt with `replayed` set; a replay
    /// of a rejected one returns [`LedgerError::ReplayedRejection`].
    pub async fn exchange(
        &self,
        cx: &TxContext,
        pairs: &[ExchangePair],
        metadata: &str,
    ) -> LedgerResult<UtxoReceipt> {
        let mut receipt = UtxoReceipt::new(cx, TxType::Exchange);
        let hash = content_hash(&(pairs, metadata))?;
        if let Some(cached) = self
            .store
            .find::<TxCacheRecord>(Doc::TxCache, &hash)
            .await?
        {
            info!(%hash, status = %cached.status, "exchange replayed from cache");
            return match cached.status {
                TxStatus::Confirmed => {
                    receipt.replayed = true;
                    Ok(receipt)
                }
                _ => Err(LedgerError::ReplayedRejection(cached.error_message)),
            };
        }

        let validated = match self.validate_exchange(cx, pairs).await {
            Ok(validated) => validated,
            Err(err) => {
                warn!(%hash, error = %err, "exchange rejected");
                self.remember(cx, &hash, TxStatus::Rejected, err.to_string())
                    .await?;
                return Err(err);
            }
        };

        let (spent, created): (Vec<_>, Vec<_>) = validated
            .into_iter()
            .map(|(ins, outs)| (ins.records, outs.records))
            .unzip();
        let spent: Vec<UtxoRecord> = spent.into_iter().flatten().collect();
        let created: Vec<UtxoRecord> = created.into_iter().flatten().collect();

        if let Err(err) = validator::commit(self.store.as_ref(), &spent, &created).await {
            warn!(%hash, error = %err, "exchange commit failed");
            self.remember(cx, &hash, TxStatus::Rejected, err.to_string())
                .await?;
            return Err(err);
        }
        self.remember(cx, &hash, TxStatus::Confirmed, String::new())
            .await?;

        info!(tx_id = %receipt.tx_id, pairs = pairs.len(), "utxo exchange");
        receipt.spent = spent;
        receipt.created = created;
        Ok(receipt)
    }

    async fn validate_exchange(
        &self,
        cx: &TxContext,
        pairs: &[ExchangePair],
    ) -> LedgerResult<Vec<(InputSummary, OutputSummary)>> {
        if pairs.is_empty() {
            return Err(LedgerError::EmptyInput("exchange pairs".into()));
        }
        let mut seen = HashSet::new();
        for id in pairs.iter().flat_map(|p| &p.inputs) {
            if !seen.insert(id) {
                return Err(LedgerError::DuplicateInput(id.clone()));
            }
        }

        let mut validated = Vec::with_capacity(pairs.len());
        let mut next_index = 0;
        for pair in pairs {
            let (ins, outs) = self
                .balanced_spend(cx, &pair.inputs, &pair.outputs, next_index)
                .await?;
            if ins.token()? != &pair.token_id {
                return Err(LedgerError::MixedTokens {
                    expected: pair.token_id.clone(),
                    found: ins.token()?.clone(),
                });
            }
            next_index += outs.records.len();
            validated.push((ins, outs));
        }
        Ok(validated)
    }

    /// Validate a single-token spend whose inputs and outputs are equal.
    async fn balanced_spend(
        &self,
        cx: &TxContext,
        inputs: &[UtxoId],
        outputs: &[UtxoOutputRequest],
        first_index: usize,
    ) -> LedgerResult<(InputSummary, OutputSummary)> {
        let ins = validate_and_summarize_inputs(self.store.as_ref(), inputs).await?;
        let outs = validate_and_summarize_outputs(
            &cx.invocation_id,
            first_index,
            outputs,
            &self.reserve,
        )?;
        outs.require_token(ins.token()?)?;
        if ins.total != outs.total {
            return Err(LedgerError::AmountMismatch {
                inputs: ins.total,
                outputs: outs.total,
            });
        }
        Ok((ins, outs))
    }

    async fn load_token(&self, token: &TokenId) -> LedgerResult<TokenType> {
        self.store.load(Doc::Tokens, token.as_str()).await
    }

    async fn remember(
        &self,
        cx: &TxContext,
        hash: &str,
        status: TxStatus,
        error_message: String,
    ) -> LedgerResult<()> {
        self.store
            .insert(&TxCacheRecord {
                hash: hash.to_string(),
                status,
                error_message,
                created_at: cx.timestamp,
            })
            .await
    }
}
