//! # openledger-utxo
//!
//! UTXO validation and spend engine.
//!
//! - [`validator`]: input/output validation and summarisation, spend commit
//! - [`UtxoEngine`]: the UTXO-level flows (mint, transfer, burn, issue,
//!   exchange) built on the validator
//!
//! No flow writes anything until every check for that flow has passed.
//! Writes themselves are individual store calls; a store failure part-way
//! through a commit is reported, not undone.

pub mod engine;
pub mod validator;

pub use engine::{ExchangePair, UtxoEngine, UtxoReceipt};
pub use validator::{InputSummary, OutputSummary};
