//! # openledger-settlement
//!
//! Batch settlement of pending transaction records.
//!
//! - [`BalanceCache`]: per-batch overlay of wallet balances, flushed once
//! - [`handlers`]: one [`TxHandler`] per transaction kind
//! - [`SettleContext`]: cache plus rollback journal handed to handlers
//! - [`SupplyLedger`]: per-transaction conservation check
//! - [`SettlementCoordinator`]: the batch loop and two-phase persistence

pub mod balance_cache;
pub mod context;
pub mod coordinator;
pub mod handlers;
pub mod supply;

pub use balance_cache::{BalanceCache, BalanceKey, CacheEntry};
pub use context::{RollbackStep, SettleContext};
pub use coordinator::{SettlementCoordinator, SettlementReport};
pub use handlers::{TxHandler, handler_for};
pub use supply::{Conservation, SupplyLedger};
