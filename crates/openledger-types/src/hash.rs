//! Content hashing for idempotency keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::LedgerResult;

/// Hex SHA-256 of the JSON encoding of `value`.
///
/// Two requests that serialize identically hash identically, which is what
/// the idempotency caches key on. Field order follows struct declaration
/// order, so the encoding is stable for a given type.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> LedgerResult<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(sha256_hex(&bytes))
}

/// Hex SHA-256 of raw bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
