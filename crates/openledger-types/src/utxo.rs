//! Unspent-output records.

use serde::{Deserialize, Serialize};

use crate::{Amount, TokenId, UtxoId, WalletId};

/// Spend state of a UTXO. Encoded as `0`/`1` in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UtxoStatus {
    #[default]
    Unspent,
    Spent,
}

impl Serialize for UtxoStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            Self::Unspent => 0,
            Self::Spent => 1,
        })
    }
}

impl<'de> Deserialize<'de> for UtxoStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Self::Unspent),
            1 => Ok(Self::Spent),
            other => Err(serde::de::Error::custom(format!(
                "invalid UTXO status {other}"
            ))),
        }
    }
}

/// A discrete, independently spendable balance chunk.
///
/// Once `Spent` a UTXO can never be an input again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoRecord {
    pub id: UtxoId,
    pub wallet_id: WalletId,
    pub token_id: TokenId,
    pub amount: Amount,
    pub status: UtxoStatus,
}

impl UtxoRecord {
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.status == UtxoStatus::Spent
    }
}

/// A requested new output, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoOutputRequest {
    pub wallet_id: WalletId,
    pub token_id: TokenId,
    pub amount: Amount,
}

impl UtxoOutputRequest {
    #[must_use]
    pub fn new(wallet_id: impl Into<WalletId>, token_id: impl Into<TokenId>, amount: u64) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            token_id: token_id.into(),
            amount: Amount::from_base_units(amount),
        }
    }
}
