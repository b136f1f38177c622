//! Error types for the OpenLedger settlement engine.
//!
//! All errors use the `OL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by the failure taxonomy:
//! - 1xx: Validation errors (malformed input, caught before any mutation)
//! - 2xx: Not-found errors (referenced wallet/token/UTXO/campaign missing)
//! - 3xx: Conflict errors (insufficient balance, spent UTXO, supply caps)
//! - 4xx: Persistence errors (store read/write failures)
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Amount, BalanceDomain, Doc, TokenId, TxId, UtxoId, WalletId};

/// Coarse classification of a [`LedgerError`].
///
/// Batch processing catches `Validation`, `NotFound` and `Conflict` per item
/// and records them as rejections. `Persistence` during a flush aborts the
/// whole call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Persistence,
    Internal,
}

/// Central error enum for all OpenLedger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The transaction record is structurally invalid for its kind.
    #[error("OL_ERR_100: Invalid transaction {tx_id}: {reason}")]
    InvalidTransaction { tx_id: TxId, reason: String },

    /// An amount was zero, blank or not a base-10 integer.
    #[error("OL_ERR_101: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The reserve wallet appeared where only user wallets are allowed
    /// (or was missing where it is required).
    #[error("OL_ERR_102: Reserve wallet misuse in {tx_id}: {reason}")]
    ReserveWalletMisuse { tx_id: TxId, reason: String },

    /// The same UTXO was referenced twice in one input set.
    #[error("OL_ERR_103: Duplicate UTXO input: {0}")]
    DuplicateInput(UtxoId),

    /// Input and output totals don't satisfy the conservation rule.
    #[error("OL_ERR_104: Amount mismatch: inputs {inputs}, outputs {outputs}")]
    AmountMismatch { inputs: Amount, outputs: Amount },

    /// An exchange correlation group has fewer than two pending legs.
    #[error("OL_ERR_105: Exchange {correlation_id} needs at least 2 legs, found {found}")]
    IncompleteExchange {
        correlation_id: String,
        found: usize,
    },

    /// Inputs/outputs mixed tokens where a single token is required.
    #[error("OL_ERR_106: Mixed tokens: expected {expected}, found {found}")]
    MixedTokens { expected: TokenId, found: TokenId },

    /// A request batch or input set was empty.
    #[error("OL_ERR_107: Empty input: {0}")]
    EmptyInput(String),

    // =================================================================
    // Not Found Errors (2xx)
    // =================================================================
    /// Generic record lookup miss.
    #[error("OL_ERR_200: Record not found: {doc}/{key}")]
    RecordNotFound { doc: Doc, key: String },

    /// No balance record exists for a debit on first touch.
    #[error("OL_ERR_201: Balance not found: {domain}/{wallet}/{token}")]
    BalanceNotFound {
        domain: BalanceDomain,
        wallet: WalletId,
        token: TokenId,
    },

    /// The referenced UTXO does not exist.
    #[error("OL_ERR_202: UTXO not found: {0}")]
    UtxoNotFound(UtxoId),

    // =================================================================
    // Conflict Errors (3xx)
    // =================================================================
    /// Not enough balance to perform a debit.
    #[error("OL_ERR_300: Insufficient balance for {wallet}/{token}: need {needed}, have {available}")]
    InsufficientBalance {
        wallet: WalletId,
        token: TokenId,
        needed: Amount,
        available: Amount,
    },

    /// The UTXO was already consumed by an earlier spend.
    #[error("OL_ERR_301: UTXO already spent: {0}")]
    UtxoAlreadySpent(UtxoId),

    /// Minting would push total supply past the configured max supply.
    #[error("OL_ERR_302: Over max supply for {token}: new total {new_total}, max {max_supply}")]
    OverMaxSupply {
        token: TokenId,
        new_total: Amount,
        max_supply: Amount,
    },

    /// Burning more than the recorded total supply.
    #[error("OL_ERR_303: Supply underflow for {token}: supply {supply}, burn {amount}")]
    SupplyUnderflow {
        token: TokenId,
        supply: Amount,
        amount: Amount,
    },

    /// The campaign has no remaining capacity.
    #[error("OL_ERR_304: Campaign {0} is sold out")]
    CampaignSoldOut(String),

    /// Enrollment allow-list rejected the wallet.
    #[error("OL_ERR_305: Wallet {wallet} not enrolled for {token}")]
    NotEnrolled { wallet: WalletId, token: TokenId },

    /// `create` on a key that already holds a record.
    #[error("OL_ERR_306: Record already exists: {doc}/{key}")]
    RecordExists { doc: Doc, key: String },

    /// A previous identical request was rejected; the cached rejection is replayed.
    #[error("OL_ERR_307: Replayed rejection: {0}")]
    ReplayedRejection(String),

    /// Net balance deltas of a value-moving transaction didn't sum to zero.
    #[error("OL_ERR_308: Conservation violation in {tx_id}: {reason}")]
    ConservationViolation { tx_id: TxId, reason: String },

    // =================================================================
    // Persistence Errors (4xx)
    // =================================================================
    /// A store read or write failed.
    #[error("OL_ERR_400: Persistence failure on {doc}/{key}: {reason}")]
    Persistence {
        doc: Doc,
        key: String,
        reason: String,
    },

    /// A stored document could not be (de)serialized.
    #[error("OL_ERR_401: Serialization error: {0}")]
    Serialization(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Arithmetic overflow on a 256-bit amount.
    #[error("OL_ERR_900: Amount overflow")]
    AmountOverflow,

    /// Configuration error (invalid config file, bad values).
    #[error("OL_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Unrecoverable internal error (worker panic, etc.).
    #[error("OL_ERR_902: Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Taxonomy bucket of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransaction { .. }
            | Self::InvalidAmount { .. }
            | Self::ReserveWalletMisuse { .. }
            | Self::DuplicateInput(_)
            | Self::AmountMismatch { .. }
            | Self::IncompleteExchange { .. }
            | Self::MixedTokens { .. }
            | Self::EmptyInput(_) => ErrorKind::Validation,
            Self::RecordNotFound { .. } | Self::BalanceNotFound { .. } | Self::UtxoNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InsufficientBalance { .. }
            | Self::UtxoAlreadySpent(_)
            | Self::OverMaxSupply { .. }
            | Self::SupplyUnderflow { .. }
            | Self::CampaignSoldOut(_)
            | Self::NotEnrolled { .. }
            | Self::RecordExists { .. }
            | Self::ReplayedRejection(_)
            | Self::ConservationViolation { .. } => ErrorKind::Conflict,
            Self::Persistence { .. } | Self::Serialization(_) => ErrorKind::Persistence,
            Self::AmountOverflow | Self::Configuration(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Shorthand for a [`LedgerError::InvalidTransaction`].
    pub fn invalid_tx(tx_id: &TxId, reason: impl Into<String>) -> Self {
        Self::InvalidTransaction {
            tx_id: tx_id.clone(),
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
