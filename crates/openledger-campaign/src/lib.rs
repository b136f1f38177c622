//! # openledger-campaign
//!
//! Idempotent batch purchases for fundraising campaigns.
//!
//! - [`PurchaseEngine`]: sequential decision phase, bounded parallel flush,
//!   content-hash replay cache
//! - [`TaskGroup`]: semaphore-bounded task set with a first-error latch

pub mod engine;
pub mod task_group;

pub use engine::PurchaseEngine;
pub use task_group::TaskGroup;
