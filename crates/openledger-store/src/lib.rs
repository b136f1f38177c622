//! # openledger-store
//!
//! The repository contract consumed by the OpenLedger engines.
//!
//! - [`LedgerStore`]: namespaced key-value access (get / create / update / query)
//! - [`Record`] + [`RecordStoreExt`]: typed access for ledger records
//! - [`RecordFilter`]: field-equality query with ordering and a limit
//! - [`keys`]: composite key layout per namespace
//! - [`MemoryStore`]: ordered in-memory implementation with fault injection
//!
//! The engines never assume a multi-key atomic write; every `create` and
//! `update` stands alone.

pub mod filter;
pub mod keys;
pub mod memory;
pub mod record;
pub mod repository;

pub use filter::RecordFilter;
pub use memory::MemoryStore;
pub use record::{Record, RecordStoreExt};
pub use repository::LedgerStore;
