//! # openledger-types
//!
//! Shared types, errors, and configuration for the **OpenLedger** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Amounts**: [`Amount`], a checked 256-bit count of base units
//! - **Identifiers**: [`WalletId`], [`TokenId`], [`TxId`], [`UtxoId`], [`CampaignId`],
//!   [`AssetId`], [`RequestId`]
//! - **Namespaces**: [`Doc`], [`BalanceDomain`]
//! - **Transaction model**: [`TransactionRecord`], [`TxType`], [`TxStatus`]
//! - **Balances**: [`BalanceRecord`]
//! - **UTXO model**: [`UtxoRecord`], [`UtxoStatus`], [`UtxoOutputRequest`]
//! - **Tokens**: [`TokenType`], [`Enrollment`]
//! - **Campaigns**: [`Campaign`], [`Asset`], [`InvestorBook`], [`PurchaseRequest`],
//!   [`PurchaseResult`]
//! - **Invocation context**: [`TxContext`] and [`content_hash`]
//! - **Configuration**: [`LedgerConfig`], [`TelemetryConfig`]
//! - **Errors**: [`LedgerError`] with `OL_ERR_` prefix codes

pub mod amount;
pub mod balance;
pub mod campaign;
pub mod config;
pub mod constants;
pub mod context;
pub mod domain;
pub mod error;
pub mod hash;
pub mod ids;
pub mod telemetry;
pub mod token;
pub mod transaction;
pub mod utxo;

// Re-export all primary types at crate root for ergonomic imports:
//   use openledger_types::{Amount, TransactionRecord, WalletId, ...};

pub use amount::*;
pub use balance::*;
pub use campaign::*;
pub use config::*;
pub use context::*;
pub use domain::*;
pub use error::*;
pub use hash::*;
pub use ids::*;
pub use token::*;
pub use transaction::*;
pub use utxo::*;

// Constants are accessed via `openledger_types::constants::FOO`
// (not re-exported to avoid name collisions).
