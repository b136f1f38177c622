//! Input/output validation for UTXO spends.

use std::collections::HashSet;

use tracing::debug;

use openledger_store::{LedgerStore, RecordStoreExt};
use openledger_types::{
    Amount, Doc, LedgerError, LedgerResult, TokenId, UtxoId, UtxoOutputRequest, UtxoRecord,
    UtxoStatus, WalletId,
};

/// Validated inputs: the loaded records and their total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSummary {
    pub records: Vec<UtxoRecord>,
    pub total: Amount,
}

impl InputSummary {
    /// The single token every input carries.
    pub fn token(&self) -> LedgerResult<&TokenId> {
        single_token(&self.records)
    }
}

/// Validated outputs: records with assigned ids and their total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub records: Vec<UtxoRecord>,
    pub total: Amount,
}

impl OutputSummary {
    /// Total of the outputs addressed to `reserve`.
    pub fn burned(&self, reserve: &WalletId) -> LedgerResult<Amount> {
        Amount::try_sum(
            self.records
                .iter()
                .filter(|r| &r.wallet_id == reserve)
                .map(|r| r.amount),
        )
    }

    /// Fail unless every output carries `token`.
    pub fn require_token(&self, token: &TokenId) -> LedgerResult<()> {
        match self.records.iter().find(|r| &r.token_id != token) {
            Some(other) => Err(LedgerError::MixedTokens {
                expected: token.clone(),
                found: other.token_id.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Load and check every referenced input.
///
/// Rejects an empty set, a reference repeated within the set, a missing
/// UTXO, and a UTXO already spent.
pub async fn validate_and_summarize_inputs<S>(
    store: &S,
    refs: &[UtxoId],
) -> LedgerResult<InputSummary>
where
    S: LedgerStore + ?Sized,
{
    if refs.is_empty() {
        return Err(LedgerError::EmptyInput("utxo inputs".into()));
    }
    let mut seen = HashSet::with_capacity(refs.len());
    if let Some(dup) = refs.iter().find(|id| !seen.insert(*id)) {
        return Err(LedgerError::DuplicateInput(dup.clone()));
    }

    let mut records = Vec::with_capacity(refs.len());
    let mut total = Amount::ZERO;
    for id in refs {
        let utxo: UtxoRecord = store
            .find(Doc::Utxos, id.as_str())
            .await?
            .ok_or_else(|| LedgerError::UtxoNotFound(id.clone()))?;
        if utxo.is_spent() {
            return Err(LedgerError::UtxoAlreadySpent(id.clone()));
        }
        total = total.try_add(utxo.amount)?;
        records.push(utxo);
    }
    debug!(inputs = records.len(), %total, "validated utxo inputs");
    Ok(InputSummary { records, total })
}

/// Assign ids to requested outputs and check their amounts.
///
/// Output `i` gets id `<origin>.<first_index + i>`. Outputs addressed to
/// `reserve` are created already spent.
pub fn validate_and_summarize_outputs(
    origin: &str,
    first_index: usize,
    requests: &[UtxoOutputRequest],
    reserve: &WalletId,
) -> LedgerResult<OutputSummary> {
    if requests.is_empty() {
        return Err(LedgerError::EmptyInput("utxo outputs".into()));
    }
    let mut records = Vec::with_capacity(requests.len());
    let mut total = Amount::ZERO;
    for (i, req) in requests.iter().enumerate() {
        if req.amount.is_zero() {
            return Err(LedgerError::InvalidAmount {
                reason: format!("output {i} to {} has zero amount", req.wallet_id),
            });
        }
        let status = if &req.wallet_id == reserve {
            UtxoStatus::Spent
        } else {
            UtxoStatus::Unspent
        };
        total = total.try_add(req.amount)?;
        records.push(UtxoRecord {
            id: UtxoId::for_output(origin, first_index + i),
            wallet_id: req.wallet_id.clone(),
            token_id: req.token_id.clone(),
            amount: req.amount,
            status,
        });
    }
    Ok(OutputSummary { records, total })
}

/// Mark inputs spent and create outputs, one store write each.
pub async fn commit<S>(store: &S, spent: &[UtxoRecord], outputs: &[UtxoRecord]) -> LedgerResult<()>
where
    S: LedgerStore + ?Sized,
{
    for input in spent {
        let mut record = input.clone();
        record.status = UtxoStatus::Spent;
        store.save(&record).await?;
    }
    for output in outputs {
        store.insert(output).await?;
    }
    Ok(())
}

fn single_token(records: &[UtxoRecord]) -> LedgerResult<&TokenId> {
    let Some(first) = records.first() else {
        return Err(LedgerError::EmptyInput("utxo inputs".into()));
    };
    match records.iter().find(|r| r.token_id != first.token_id) {
        Some(other) => Err(LedgerError::MixedTokens {
            expected: first.token_id.clone(),
            found: other.token_id.clone(),
        }),
        None => Ok(&first.token_id),
    }
}
