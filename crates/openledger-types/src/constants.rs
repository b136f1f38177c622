//! System-wide constants for the OpenLedger settlement engine.

/// Number of decimal places between a display amount and a base unit.
pub const BASE_UNIT_SCALE: u32 = 8;

/// Base units per display unit (10^8).
pub const BASE_UNIT: u64 = 100_000_000;

/// Maximum pending transactions surfaced per settlement page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Bounded worker count for the purchase-engine flush pools.
pub const DEFAULT_WORKER_COUNT: usize = 20;

/// Reserve wallet that is the source of every mint and the sink of every burn.
pub const SYSTEM_WALLET: &str = "0000000000000000000000000000000000000000";

/// Length, in hex characters, of a derived record id.
pub const ID_LENGTH: usize = 40;

/// Upper bound for `id_length`: a SHA-256 digest is 64 hex characters.
pub const MAX_ID_LENGTH: usize = 64;

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";
